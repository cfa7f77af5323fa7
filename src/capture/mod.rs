//! Region capture → color inversion → clipboard pipeline.
//!
//! - Interactive region selection through the platform screenshot tool
//! - Inversion of the captured image
//! - Clipboard publishing as PNG, TIFF and a file reference
//! - Delayed removal of temporary files

pub mod cleanup;
pub mod clipboard;
pub mod file;
#[cfg(target_os = "linux")]
pub mod portal;
pub mod types;

mod dependencies;
mod manager;
mod pipeline;
mod sources;
#[cfg(test)]
mod tests;

pub use dependencies::{
    CaptureClipboard, CaptureDependencies, CaptureFeedback, CaptureSource, ImageProcessor,
};
pub use manager::CaptureManager;
pub use pipeline::PipelineOptions;
pub use types::{CaptureError, CaptureOutcome, CaptureResult, CaptureTrigger};
