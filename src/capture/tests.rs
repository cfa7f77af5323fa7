use std::{
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use image::{GrayAlphaImage, LumaA, Rgba, RgbaImage};
use tempfile::TempDir;
use tokio::time::{Duration, sleep};

use super::{
    cleanup::CleanupScheduler,
    clipboard::ClipboardPayload,
    dependencies::{
        CaptureClipboard, CaptureDependencies, CaptureFeedback, CaptureSource, ImageProcessor,
    },
    file::ArtifactPaths,
    manager::CaptureManager,
    pipeline::{CaptureRequest, PipelineOptions, perform_capture},
    types::{
        CaptureError, CaptureOutcome, CaptureResult, CaptureStatus, CaptureTrigger,
        ClipboardFormat,
    },
};
use crate::invert::{self, InvertedImage};

#[derive(Clone)]
enum SourceBehavior {
    /// Write a white PNG of the given size.
    White(u32, u32),
    /// Write a gray+alpha PNG of the given size.
    GrayAlpha(u32, u32),
    /// Keep the selection open for the given milliseconds, then write nothing.
    Stalled(u64),
    /// Write bytes that are not an image.
    Garbage,
    /// Leave a zero-length file behind.
    EmptyFile,
    /// Exit without writing anything.
    Nothing,
    /// Fail to start.
    LaunchFailure,
}

#[derive(Clone)]
struct MockSource {
    behavior: SourceBehavior,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockSource {
    fn new(behavior: SourceBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl CaptureSource for MockSource {
    async fn capture(&self, target: &Path) -> Result<(), CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Simulate the user dragging out a region.
        sleep(Duration::from_millis(10)).await;

        let result = match &self.behavior {
            SourceBehavior::White(w, h) => {
                RgbaImage::from_pixel(*w, *h, Rgba([255, 255, 255, 255]))
                    .save(target)
                    .unwrap();
                Ok(())
            }
            SourceBehavior::GrayAlpha(w, h) => {
                GrayAlphaImage::from_pixel(*w, *h, LumaA([255, 128]))
                    .save(target)
                    .unwrap();
                Ok(())
            }
            SourceBehavior::Stalled(ms) => {
                sleep(Duration::from_millis(*ms)).await;
                Ok(())
            }
            SourceBehavior::Garbage => {
                std::fs::write(target, b"definitely not a png").unwrap();
                Ok(())
            }
            SourceBehavior::EmptyFile => {
                std::fs::write(target, b"").unwrap();
                Ok(())
            }
            SourceBehavior::Nothing => Ok(()),
            SourceBehavior::LaunchFailure => {
                Err(CaptureError::LaunchFailed("screencapture missing".into()))
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[derive(Clone, Default)]
struct CountingProcessor {
    calls: Arc<AtomicUsize>,
}

impl ImageProcessor for CountingProcessor {
    fn invert(&self, path: &Path) -> Result<InvertedImage, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        invert::load_and_invert(path).map_err(CaptureError::Inversion)
    }
}

#[derive(Clone, Default)]
struct MockClipboard {
    should_fail: bool,
    payloads: Arc<Mutex<Vec<ClipboardPayload>>>,
}

impl CaptureClipboard for MockClipboard {
    fn publish(&self, payload: &ClipboardPayload) -> Result<(), CaptureError> {
        if self.should_fail {
            return Err(CaptureError::ClipboardError("pasteboard rejected".into()));
        }
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingFeedback {
    published: Arc<AtomicUsize>,
    failures: Arc<Mutex<Vec<String>>>,
}

impl CaptureFeedback for RecordingFeedback {
    fn published(&self, _result: &CaptureResult) {
        self.published.fetch_add(1, Ordering::SeqCst);
    }

    fn failed(&self, error: &CaptureError) {
        self.failures.lock().unwrap().push(error.to_string());
    }
}

struct Harness {
    _temp: TempDir,
    options: PipelineOptions,
    source: MockSource,
    processor: CountingProcessor,
    clipboard: MockClipboard,
    feedback: RecordingFeedback,
}

impl Harness {
    fn new(behavior: SourceBehavior) -> Self {
        let temp = TempDir::new().unwrap();
        let options = PipelineOptions {
            paths: ArtifactPaths::in_dir(temp.path(), "capture.png"),
            include_tiff: true,
            stage_file: true,
        };
        Self {
            _temp: temp,
            options,
            source: MockSource::new(behavior),
            processor: CountingProcessor::default(),
            clipboard: MockClipboard::default(),
            feedback: RecordingFeedback::default(),
        }
    }

    fn failing_clipboard(mut self) -> Self {
        self.clipboard.should_fail = true;
        self
    }

    fn dependencies(&self) -> CaptureDependencies {
        CaptureDependencies {
            source: Arc::new(self.source.clone()),
            processor: Arc::new(self.processor.clone()),
            clipboard: Arc::new(self.clipboard.clone()),
            feedback: Arc::new(self.feedback.clone()),
        }
    }

    fn cleanup(&self) -> CleanupScheduler {
        self.cleanup_after(Duration::from_millis(20))
    }

    fn cleanup_after(&self, delay: Duration) -> CleanupScheduler {
        CleanupScheduler::new(tokio::runtime::Handle::current(), delay)
    }

    async fn run(&self, cleanup: &CleanupScheduler) -> Result<CaptureResult, CaptureError> {
        self.run_with(cleanup, self.dependencies()).await
    }

    async fn run_with(
        &self,
        cleanup: &CleanupScheduler,
        dependencies: CaptureDependencies,
    ) -> Result<CaptureResult, CaptureError> {
        let status = tokio::sync::Mutex::new(CaptureStatus::Capturing);
        perform_capture(
            CaptureRequest {
                trigger: CaptureTrigger::Hotkey,
            },
            &self.options,
            Arc::new(dependencies),
            cleanup,
            &status,
        )
        .await
    }

    fn manager(&self) -> CaptureManager {
        CaptureManager::with_dependencies(
            &tokio::runtime::Handle::current(),
            self.options.clone(),
            self.cleanup(),
            self.dependencies(),
        )
    }

    fn processor_calls(&self) -> usize {
        self.processor.calls.load(Ordering::SeqCst)
    }

    fn published_payloads(&self) -> Vec<ClipboardPayload> {
        self.clipboard.payloads.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn white_region_is_published_black_with_same_dimensions() {
    let harness = Harness::new(SourceBehavior::White(2, 2));
    let cleanup = harness.cleanup();

    let result = harness.run(&cleanup).await.unwrap();
    assert_eq!((result.width, result.height), (2, 2));
    assert_eq!(result.trigger, CaptureTrigger::Hotkey);
    assert_eq!(
        result.formats,
        vec![
            ClipboardFormat::Png,
            ClipboardFormat::Tiff,
            ClipboardFormat::FileReference
        ]
    );
    assert_eq!(harness.processor_calls(), 1);

    let payloads = harness.published_payloads();
    assert_eq!(payloads.len(), 1);
    let readback = image::load_from_memory(&payloads[0].png).unwrap().to_rgba8();
    assert_eq!(readback.dimensions(), (2, 2));
    assert!(readback.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));

    let staged = result.staged_file.clone().unwrap();
    assert_eq!(staged, harness.options.paths.staged);
    assert!(staged.exists(), "staged file must outlive the publish step");
}

#[tokio::test]
async fn temporary_files_are_removed_after_delay_on_success() {
    let harness = Harness::new(SourceBehavior::White(3, 1));
    let cleanup = harness.cleanup();

    harness.run(&cleanup).await.unwrap();
    assert!(harness.options.paths.capture.exists());

    cleanup.wait_idle().await;
    assert!(!harness.options.paths.capture.exists());
    assert!(!harness.options.paths.staged.exists());
}

#[tokio::test]
async fn earlier_files_are_removed_while_next_selection_is_open() {
    let harness = Harness::new(SourceBehavior::White(2, 2));
    let cleanup = harness.cleanup_after(Duration::from_secs(60));

    let first = harness.run(&cleanup).await.unwrap();
    let staged = first.staged_file.unwrap();
    assert!(staged.exists());

    let slow = CaptureDependencies {
        source: Arc::new(MockSource::new(SourceBehavior::Stalled(400))),
        ..harness.dependencies()
    };
    let (second, ()) = tokio::join!(harness.run_with(&cleanup, slow), async {
        sleep(Duration::from_millis(100)).await;
        assert!(
            !staged.exists(),
            "staged file from the first run survived into the second selection"
        );
        assert!(!harness.options.paths.capture.exists());
    });
    assert!(matches!(second, Err(CaptureError::Cancelled(_))));
}

#[tokio::test]
async fn gray_alpha_capture_publishes_png_and_tiff() {
    let harness = Harness::new(SourceBehavior::GrayAlpha(3, 2));
    let cleanup = harness.cleanup();

    let result = harness.run(&cleanup).await.unwrap();
    assert_eq!((result.width, result.height), (3, 2));
    assert!(result.formats.contains(&ClipboardFormat::Tiff));

    let payloads = harness.published_payloads();
    let tiff = payloads[0].tiff.as_ref().unwrap();
    let decoded = image::load_from_memory_with_format(tiff, image::ImageFormat::Tiff)
        .unwrap()
        .to_rgba8();
    assert_eq!(decoded.dimensions(), (3, 2));
    assert!(decoded.pixels().all(|p| *p == Rgba([0, 0, 0, 128])));
}

#[tokio::test]
async fn cancelled_selection_never_reaches_inverter() {
    let harness = Harness::new(SourceBehavior::Nothing);
    let cleanup = harness.cleanup();

    let err = harness.run(&cleanup).await.unwrap_err();
    assert!(matches!(err, CaptureError::Cancelled(_)));
    assert!(!err.is_user_visible());
    assert_eq!(harness.processor_calls(), 0);
    assert!(harness.published_payloads().is_empty());
}

#[tokio::test]
async fn empty_capture_is_a_cancellation_and_removed_at_once() {
    let harness = Harness::new(SourceBehavior::EmptyFile);
    let cleanup = harness.cleanup();

    let err = harness.run(&cleanup).await.unwrap_err();
    assert!(matches!(err, CaptureError::Cancelled(_)));
    assert_eq!(harness.processor_calls(), 0);
    assert!(!harness.options.paths.capture.exists());
}

#[tokio::test]
async fn stale_capture_is_not_reused_after_cancellation() {
    let harness = Harness::new(SourceBehavior::Nothing);
    RgbaImage::from_pixel(1, 1, Rgba([9, 9, 9, 255]))
        .save(&harness.options.paths.capture)
        .unwrap();

    let err = harness.run(&harness.cleanup()).await.unwrap_err();
    assert!(matches!(err, CaptureError::Cancelled(_)));
    assert_eq!(harness.processor_calls(), 0);
}

#[tokio::test]
async fn launch_failure_is_user_visible() {
    let harness = Harness::new(SourceBehavior::LaunchFailure);

    let err = harness.run(&harness.cleanup()).await.unwrap_err();
    assert!(matches!(err, CaptureError::LaunchFailed(_)));
    assert!(err.is_user_visible());
    assert_eq!(harness.processor_calls(), 0);
}

#[tokio::test]
async fn undecodable_capture_stops_silently_and_is_cleaned_up() {
    let harness = Harness::new(SourceBehavior::Garbage);
    let cleanup = harness.cleanup();

    let err = harness.run(&cleanup).await.unwrap_err();
    assert!(matches!(err, CaptureError::Inversion(_)));
    assert!(!err.is_user_visible());
    assert_eq!(harness.processor_calls(), 1);
    assert!(harness.published_payloads().is_empty());

    cleanup.wait_idle().await;
    assert!(!harness.options.paths.capture.exists());
}

#[tokio::test]
async fn clipboard_rejection_still_cleans_up() {
    let harness = Harness::new(SourceBehavior::White(2, 2)).failing_clipboard();
    let cleanup = harness.cleanup();

    let err = harness.run(&cleanup).await.unwrap_err();
    assert!(matches!(err, CaptureError::ClipboardError(_)));
    assert!(err.is_user_visible());

    cleanup.wait_idle().await;
    assert!(!harness.options.paths.capture.exists());
    assert!(!harness.options.paths.staged.exists());
}

#[tokio::test]
async fn staging_can_be_disabled() {
    let mut harness = Harness::new(SourceBehavior::White(1, 1));
    harness.options.stage_file = false;
    harness.options.include_tiff = false;

    let result = harness.run(&harness.cleanup()).await.unwrap();
    assert_eq!(result.formats, vec![ClipboardFormat::Png]);
    assert!(result.staged_file.is_none());
    assert!(!harness.options.paths.staged.exists());
}

#[tokio::test]
async fn test_capture_manager_creation() {
    let harness = Harness::new(SourceBehavior::Nothing);
    let manager = harness.manager();
    assert_eq!(manager.get_status().await, CaptureStatus::Idle);
}

#[tokio::test]
async fn manager_reports_success_to_feedback() {
    let harness = Harness::new(SourceBehavior::White(2, 2));
    let manager = harness.manager();

    let outcome = manager
        .capture_and_wait(CaptureTrigger::Menu)
        .await
        .unwrap();
    match outcome {
        CaptureOutcome::Success(result) => {
            assert_eq!(result.trigger, CaptureTrigger::Menu);
            assert_eq!((result.width, result.height), (2, 2));
        }
        other => panic!("Expected success outcome, got {other:?}"),
    }

    assert_eq!(manager.get_status().await, CaptureStatus::Success);
    assert_eq!(harness.feedback.published.load(Ordering::SeqCst), 1);
    assert!(harness.feedback.failures.lock().unwrap().is_empty());

    manager.flush_cleanup().await;
    assert!(!harness.options.paths.capture.exists());
}

#[tokio::test]
async fn manager_keeps_cancellation_silent() {
    let harness = Harness::new(SourceBehavior::Nothing);
    let manager = harness.manager();

    let outcome = manager
        .capture_and_wait(CaptureTrigger::Hotkey)
        .await
        .unwrap();
    assert!(matches!(outcome, CaptureOutcome::Cancelled(_)));
    assert!(matches!(
        manager.get_status().await,
        CaptureStatus::Cancelled(_)
    ));
    assert_eq!(harness.feedback.published.load(Ordering::SeqCst), 0);
    assert!(harness.feedback.failures.lock().unwrap().is_empty());
}

#[tokio::test]
async fn manager_records_failure_status() {
    let harness = Harness::new(SourceBehavior::White(2, 2)).failing_clipboard();
    let manager = harness.manager();

    manager.request_capture(CaptureTrigger::Signal).unwrap();

    let mut outcome = None;
    for _ in 0..50 {
        if let Some(result) = manager.take_result().await {
            outcome = Some(result);
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }

    match outcome {
        Some(CaptureOutcome::Failed(msg)) => {
            assert!(
                msg.contains("pasteboard rejected"),
                "unexpected failure message: {msg}"
            );
        }
        other => panic!("Expected failure outcome, got {other:?}"),
    }

    assert!(matches!(
        manager.get_status().await,
        CaptureStatus::Failed(_)
    ));
    assert_eq!(harness.feedback.failures.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn manager_runs_requests_one_at_a_time() {
    let harness = Harness::new(SourceBehavior::White(1, 1));
    let manager = harness.manager();

    manager.request_capture(CaptureTrigger::Hotkey).unwrap();
    manager.request_capture(CaptureTrigger::Hotkey).unwrap();
    let last = manager
        .capture_and_wait(CaptureTrigger::Menu)
        .await
        .unwrap();

    assert!(matches!(last, CaptureOutcome::Success(_)));
    assert_eq!(harness.source.calls.load(Ordering::SeqCst), 3);
    assert_eq!(harness.source.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(harness.processor_calls(), 3);
}

#[tokio::test]
async fn request_capture_returns_error_when_channel_closed() {
    let manager = CaptureManager::with_closed_channel_for_test(&tokio::runtime::Handle::current());
    let err = manager
        .request_capture(CaptureTrigger::Menu)
        .expect_err("should fail when channel closed");
    assert!(
        matches!(err, CaptureError::Task(ref msg) if msg.contains("not running")),
        "unexpected error variant: {err:?}"
    );
}
