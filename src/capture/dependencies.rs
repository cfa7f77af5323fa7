use std::{path::Path, sync::Arc};

use async_trait::async_trait;

use crate::capture::{
    clipboard::{self, ClipboardPayload},
    sources,
    types::{CaptureError, CaptureResult},
};
use crate::invert::{self, InvertedImage};

/// Abstraction over the OS region-selection tool. Implementations write a
/// PNG to `target` or leave it absent when the user cancels.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    async fn capture(&self, target: &Path) -> Result<(), CaptureError>;
}

/// Abstraction over decoding and inverting the captured file.
pub trait ImageProcessor: Send + Sync {
    fn invert(&self, path: &Path) -> Result<InvertedImage, CaptureError>;
}

/// Abstraction over publishing an encoded payload to the clipboard.
pub trait CaptureClipboard: Send + Sync {
    fn publish(&self, payload: &ClipboardPayload) -> Result<(), CaptureError>;
}

/// Receives the outcome of each pipeline run.
pub trait CaptureFeedback: Send + Sync {
    fn published(&self, result: &CaptureResult);
    fn failed(&self, error: &CaptureError);
}

/// Bundle of dependencies used by the capture pipeline. Each component can be mocked in tests.
#[derive(Clone)]
pub struct CaptureDependencies {
    pub source: Arc<dyn CaptureSource>,
    pub processor: Arc<dyn ImageProcessor>,
    pub clipboard: Arc<dyn CaptureClipboard>,
    pub feedback: Arc<dyn CaptureFeedback>,
}

impl Default for CaptureDependencies {
    fn default() -> Self {
        Self {
            source: Arc::new(DefaultCaptureSource::default()),
            processor: Arc::new(DefaultImageProcessor),
            clipboard: Arc::new(DefaultClipboard),
            feedback: Arc::new(LogFeedback),
        }
    }
}

impl CaptureDependencies {
    /// Platform defaults with an optional replacement screenshot command.
    pub fn with_command(command: Option<Vec<String>>) -> Self {
        Self {
            source: Arc::new(DefaultCaptureSource { command }),
            ..Self::default()
        }
    }

    pub fn with_feedback(mut self, feedback: Arc<dyn CaptureFeedback>) -> Self {
        self.feedback = feedback;
        self
    }
}

#[derive(Default)]
struct DefaultCaptureSource {
    command: Option<Vec<String>>,
}
struct DefaultImageProcessor;
struct DefaultClipboard;
struct LogFeedback;

#[async_trait]
impl CaptureSource for DefaultCaptureSource {
    async fn capture(&self, target: &Path) -> Result<(), CaptureError> {
        sources::capture_region(target, self.command.as_deref()).await
    }
}

impl ImageProcessor for DefaultImageProcessor {
    fn invert(&self, path: &Path) -> Result<InvertedImage, CaptureError> {
        invert::load_and_invert(path).map_err(CaptureError::Inversion)
    }
}

impl CaptureClipboard for DefaultClipboard {
    fn publish(&self, payload: &ClipboardPayload) -> Result<(), CaptureError> {
        clipboard::copy_to_clipboard(payload)
    }
}

impl CaptureFeedback for LogFeedback {
    fn published(&self, result: &CaptureResult) {
        log::info!(
            "Inverted {}x{} capture copied to clipboard",
            result.width,
            result.height
        );
    }

    fn failed(&self, error: &CaptureError) {
        log::error!("{}", error);
    }
}
