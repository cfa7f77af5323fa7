//! Data types for the capture → invert → publish pipeline.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::invert::InvertError;

/// What started a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTrigger {
    /// Status bar / tray menu item.
    Menu,
    /// Global keyboard shortcut.
    Hotkey,
    /// `SIGUSR1`, typically bound to a compositor shortcut.
    Signal,
    /// `blackshot --capture`.
    CommandLine,
}

/// A representation placed on the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardFormat {
    Png,
    Tiff,
    FileReference,
}

impl fmt::Display for ClipboardFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClipboardFormat::Png => "png",
            ClipboardFormat::Tiff => "tiff",
            ClipboardFormat::FileReference => "file",
        })
    }
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub trigger: CaptureTrigger,
    /// Dimensions of the captured (and inverted) image.
    pub width: u32,
    pub height: u32,
    /// Formats that were written to the clipboard.
    pub formats: Vec<ClipboardFormat>,
    /// Temporary file offered as a file reference, if any. Removed after the
    /// cleanup delay.
    pub staged_file: Option<PathBuf>,
}

/// Outcome of a capture request (success or failure).
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    Success(CaptureResult),
    Failed(String),
    Cancelled(String),
}

/// Errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to launch screenshot tool: {0}")]
    LaunchFailed(String),

    #[error("Capture cancelled: {0}")]
    Cancelled(String),

    #[error("Failed to invert capture: {0}")]
    Inversion(#[source] InvertError),

    #[error("Failed to encode inverted image: {0}")]
    Encode(#[source] InvertError),

    #[error("Clipboard operation failed: {0}")]
    ClipboardError(String),

    #[error("Failed to write temporary file: {0}")]
    SaveError(#[from] std::io::Error),

    #[error("Screenshot permission denied")]
    PermissionDenied,

    #[cfg(target_os = "linux")]
    #[error("D-Bus communication error: {0}")]
    DBusError(#[from] zbus::Error),

    #[error("Screenshot tool returned invalid response: {0}")]
    InvalidResponse(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl CaptureError {
    /// Whether the failure should be surfaced with an error dialog.
    ///
    /// Cancellations and decode failures end the run silently; launch and
    /// clipboard failures are shown to the user.
    pub fn is_user_visible(&self) -> bool {
        match self {
            CaptureError::Cancelled(_) | CaptureError::Inversion(_) => false,
            CaptureError::LaunchFailed(_)
            | CaptureError::Encode(_)
            | CaptureError::ClipboardError(_)
            | CaptureError::SaveError(_)
            | CaptureError::PermissionDenied
            | CaptureError::InvalidResponse(_)
            | CaptureError::Task(_) => true,
            #[cfg(target_os = "linux")]
            CaptureError::DBusError(_) => true,
        }
    }
}

/// Status of the capture worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStatus {
    /// No capture is running.
    Idle,
    /// Waiting for the user to select a region.
    Capturing,
    /// Inverting and publishing the capture.
    Processing,
    /// The last capture completed successfully.
    Success,
    /// The last capture failed.
    Failed(String),
    /// The last capture was cancelled by the user.
    Cancelled(String),
}
