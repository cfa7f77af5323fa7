use std::path::{Path, PathBuf};

use tokio::task;

use crate::capture::types::CaptureError;

pub(crate) mod command;
#[cfg(target_os = "linux")]
mod portal;
#[cfg(target_os = "linux")]
mod reader;
#[cfg(target_os = "linux")]
mod slurp;

/// Let the user select a region and write it as PNG to `target`.
///
/// Returns `Ok` once the tool has exited, whether or not a file was written;
/// the caller decides between success and cancellation by inspecting the
/// file. `command` replaces the platform tool when set.
pub async fn capture_region(target: &Path, command: Option<&[String]>) -> Result<(), CaptureError> {
    let target: PathBuf = target.to_path_buf();

    if let Some(command) = command {
        let command = command.to_vec();
        return task::spawn_blocking(move || command::run_override(&command, &target))
            .await
            .map_err(|e| CaptureError::Task(format!("Capture task failed to join: {}", e)))?;
    }

    platform_capture(target).await
}

#[cfg(target_os = "macos")]
async fn platform_capture(target: PathBuf) -> Result<(), CaptureError> {
    task::spawn_blocking(move || {
        command::run_tool("screencapture", &command::screencapture_args(&target)).map(|_| ())
    })
    .await
    .map_err(|e| CaptureError::Task(format!("Capture task failed to join: {}", e)))?
}

#[cfg(target_os = "linux")]
async fn platform_capture(target: PathBuf) -> Result<(), CaptureError> {
    let slurp_target = target.clone();
    let result = task::spawn_blocking(move || slurp::capture_selection(&slurp_target))
        .await
        .map_err(|e| CaptureError::Task(format!("Selection capture task failed to join: {}", e)))?;

    match result {
        Err(CaptureError::LaunchFailed(reason)) => {
            log::warn!(
                "Selection capture via slurp/grim unavailable: {}. Falling back to portal.",
                reason
            );
            portal::capture_via_portal_to(&target).await
        }
        other => other,
    }
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
async fn platform_capture(_target: PathBuf) -> Result<(), CaptureError> {
    Err(CaptureError::LaunchFailed(
        "No screenshot tool is available on this platform; set capture.command".to_string(),
    ))
}
