use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot};

use crate::capture::{
    cleanup::CleanupScheduler,
    dependencies::CaptureDependencies,
    file::ArtifactPaths,
    pipeline::{CaptureRequest, PipelineOptions, perform_capture},
    types::{CaptureError, CaptureOutcome, CaptureStatus, CaptureTrigger},
};
use crate::config::Config;

struct QueuedRequest {
    request: CaptureRequest,
    reply: Option<oneshot::Sender<CaptureOutcome>>,
}

/// Shared state for running captures off the UI thread.
///
/// Requests are queued on an unbounded channel and executed one after another
/// by a single background task, so runs never overlap on the fixed temporary
/// paths.
#[derive(Clone)]
pub struct CaptureManager {
    request_tx: mpsc::UnboundedSender<QueuedRequest>,
    status: Arc<Mutex<CaptureStatus>>,
    last_result: Arc<Mutex<Option<CaptureOutcome>>>,
    cleanup: CleanupScheduler,
}

impl CaptureManager {
    /// Create a manager using the platform capture, clipboard and the given
    /// dependencies' feedback.
    pub fn from_config(
        runtime_handle: &tokio::runtime::Handle,
        config: &Config,
        dependencies: CaptureDependencies,
    ) -> Self {
        let options = PipelineOptions {
            paths: ArtifactPaths::in_temp_dir(&config.capture.temp_filename),
            include_tiff: config.clipboard.include_tiff,
            stage_file: config.clipboard.stage_file,
        };
        let cleanup = CleanupScheduler::new(
            runtime_handle.clone(),
            Duration::from_millis(config.capture.cleanup_delay_ms),
        );
        Self::with_dependencies(runtime_handle, options, cleanup, dependencies)
    }

    /// Create a capture manager with custom dependencies (useful for testing).
    pub fn with_dependencies(
        runtime_handle: &tokio::runtime::Handle,
        options: PipelineOptions,
        cleanup: CleanupScheduler,
        dependencies: CaptureDependencies,
    ) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<QueuedRequest>();
        let status = Arc::new(Mutex::new(CaptureStatus::Idle));
        let last_result = Arc::new(Mutex::new(None));
        let dependencies = Arc::new(dependencies);

        let status_clone = status.clone();
        let result_clone = last_result.clone();
        let cleanup_clone = cleanup.clone();

        runtime_handle.spawn(async move {
            while let Some(queued) = request_rx.recv().await {
                log::debug!("Processing capture request: {:?}", queued.request);

                *status_clone.lock().await = CaptureStatus::Capturing;

                let outcome = match perform_capture(
                    queued.request,
                    &options,
                    dependencies.clone(),
                    &cleanup_clone,
                    &status_clone,
                )
                .await
                {
                    Ok(result) => {
                        log::info!(
                            "Capture published: {}x{} as {:?}",
                            result.width,
                            result.height,
                            result.formats
                        );
                        dependencies.feedback.published(&result);
                        *status_clone.lock().await = CaptureStatus::Success;
                        CaptureOutcome::Success(result)
                    }
                    Err(CaptureError::Cancelled(reason)) => {
                        log::info!("Capture cancelled: {}", reason);
                        *status_clone.lock().await = CaptureStatus::Cancelled(reason.clone());
                        CaptureOutcome::Cancelled(reason)
                    }
                    Err(e) => {
                        let error_message = e.to_string();
                        if e.is_user_visible() {
                            log::error!("Capture failed: {}", error_message);
                            dependencies.feedback.failed(&e);
                        } else {
                            log::warn!("Capture abandoned: {}", error_message);
                        }
                        *status_clone.lock().await = CaptureStatus::Failed(error_message.clone());
                        CaptureOutcome::Failed(error_message)
                    }
                };

                *result_clone.lock().await = Some(outcome.clone());
                if let Some(reply) = queued.reply {
                    let _ = reply.send(outcome);
                }
            }
        });

        Self {
            request_tx,
            status,
            last_result,
            cleanup,
        }
    }

    /// Queue a capture. Returns immediately; the run happens in the background.
    pub fn request_capture(&self, trigger: CaptureTrigger) -> Result<(), CaptureError> {
        self.enqueue(trigger, None)
    }

    /// Queue a capture and wait for its outcome.
    pub async fn capture_and_wait(
        &self,
        trigger: CaptureTrigger,
    ) -> Result<CaptureOutcome, CaptureError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.enqueue(trigger, Some(reply_tx))?;
        reply_rx
            .await
            .map_err(|_| CaptureError::Task("Capture worker stopped before replying".to_string()))
    }

    fn enqueue(
        &self,
        trigger: CaptureTrigger,
        reply: Option<oneshot::Sender<CaptureOutcome>>,
    ) -> Result<(), CaptureError> {
        let queued = QueuedRequest {
            request: CaptureRequest { trigger },
            reply,
        };

        self.request_tx
            .send(queued)
            .map_err(|_| CaptureError::Task("Capture manager not running".to_string()))
    }

    /// Get the current capture status.
    pub async fn get_status(&self) -> CaptureStatus {
        self.status.lock().await.clone()
    }

    /// Get the result of the last capture and clear it.
    pub async fn take_result(&self) -> Option<CaptureOutcome> {
        self.last_result.lock().await.take()
    }

    /// Wait for all scheduled temporary-file deletions.
    pub async fn flush_cleanup(&self) {
        self.cleanup.wait_idle().await;
    }
}

#[cfg(test)]
impl CaptureManager {
    pub(crate) fn with_closed_channel_for_test(runtime_handle: &tokio::runtime::Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<QueuedRequest>();
        drop(rx);
        Self {
            request_tx: tx,
            status: Arc::new(Mutex::new(CaptureStatus::Idle)),
            last_result: Arc::new(Mutex::new(None)),
            cleanup: CleanupScheduler::new(runtime_handle.clone(), Duration::ZERO),
        }
    }
}
