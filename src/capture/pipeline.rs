use std::{fmt, sync::Arc};

use crate::capture::{
    cleanup::CleanupScheduler,
    clipboard::ClipboardPayload,
    dependencies::{CaptureClipboard, CaptureDependencies, ImageProcessor},
    file::{self, ArtifactPaths},
    types::{CaptureError, CaptureResult, CaptureStatus, CaptureTrigger},
};
use tokio::{sync::Mutex, task};

/// Per-run settings taken from the configuration.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub paths: ArtifactPaths,
    pub include_tiff: bool,
    pub stage_file: bool,
}

#[derive(Clone)]
pub(crate) struct CaptureRequest {
    pub(crate) trigger: CaptureTrigger,
}

impl fmt::Debug for CaptureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureRequest")
            .field("trigger", &self.trigger)
            .finish()
    }
}

/// Capture a region, invert it, and publish it to the clipboard.
///
/// Files still waiting for deletion from an earlier run are removed before
/// the paths are reused. A cancelled or empty capture stops before the
/// inverter and its file is removed at once. Whatever the outcome, both
/// temporary files are removed after the cleanup delay.
pub(crate) async fn perform_capture(
    request: CaptureRequest,
    options: &PipelineOptions,
    dependencies: Arc<CaptureDependencies>,
    cleanup: &CleanupScheduler,
    status: &Mutex<CaptureStatus>,
) -> Result<CaptureResult, CaptureError> {
    log::info!("Starting capture ({:?})", request.trigger);
    let paths = options.paths.clone();

    cleanup.remove_pending_now().await;
    let result = run_stages(request.trigger, options, &dependencies, cleanup, status).await;
    cleanup.schedule(vec![paths.capture, paths.staged]);
    result
}

async fn run_stages(
    trigger: CaptureTrigger,
    options: &PipelineOptions,
    dependencies: &CaptureDependencies,
    cleanup: &CleanupScheduler,
    status: &Mutex<CaptureStatus>,
) -> Result<CaptureResult, CaptureError> {
    let capture = &options.paths.capture;
    file::clear_stale(capture)?;

    if let Err(err) = dependencies.source.capture(capture).await {
        cleanup.remove_now(vec![capture.clone()]).await;
        return Err(err);
    }

    if !file::capture_is_usable(capture) {
        log::info!("No capture written to {}", capture.display());
        cleanup.remove_now(vec![capture.clone()]).await;
        return Err(CaptureError::Cancelled("no region selected".to_string()));
    }

    *status.lock().await = CaptureStatus::Processing;
    process_and_publish(trigger, options, dependencies).await
}

async fn process_and_publish(
    trigger: CaptureTrigger,
    options: &PipelineOptions,
    dependencies: &CaptureDependencies,
) -> Result<CaptureResult, CaptureError> {
    let payload = prepare_payload(Arc::clone(&dependencies.processor), options.clone()).await?;
    log::debug!(
        "Prepared {}x{} payload ({} bytes PNG)",
        payload.width,
        payload.height,
        payload.png.len()
    );

    let formats = payload.formats();
    let staged_file = payload.file.clone();
    let (width, height) = (payload.width, payload.height);

    publish(Arc::clone(&dependencies.clipboard), payload).await?;

    Ok(CaptureResult {
        trigger,
        width,
        height,
        formats,
        staged_file,
    })
}

async fn prepare_payload(
    processor: Arc<dyn ImageProcessor>,
    options: PipelineOptions,
) -> Result<ClipboardPayload, CaptureError> {
    task::spawn_blocking(move || {
        let inverted = processor.invert(&options.paths.capture)?;
        let payload = ClipboardPayload::encode(&inverted, options.include_tiff)?;

        if !options.stage_file {
            return Ok(payload);
        }

        match file::stage_file(&payload.png, &options.paths.staged) {
            Ok(path) => Ok(payload.with_file(path)),
            Err(e) => {
                log::warn!("Publishing without a file reference: {}", e);
                Ok(payload)
            }
        }
    })
    .await
    .map_err(|e| CaptureError::Task(format!("Inversion task failed: {}", e)))?
}

async fn publish(
    clipboard: Arc<dyn CaptureClipboard>,
    payload: ClipboardPayload,
) -> Result<(), CaptureError> {
    task::spawn_blocking(move || clipboard.publish(&payload))
        .await
        .map_err(|e| CaptureError::ClipboardError(format!("Clipboard task failed: {}", e)))?
}
