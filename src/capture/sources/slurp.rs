use std::path::Path;
use std::process::{Command, Stdio};

use crate::capture::types::CaptureError;

/// Ask `slurp` for a region. An empty geometry or a non-zero exit (Escape,
/// right click) is a cancellation.
fn select_geometry() -> Result<String, CaptureError> {
    // `slurp` outputs geometry in the format "x,y widthxheight"
    let output = Command::new("slurp")
        .args(["-f", "%x,%y %wx%h"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            CaptureError::LaunchFailed(format!("Failed to run slurp for region selection: {}", e))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CaptureError::Cancelled(format!(
            "slurp exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let geometry = String::from_utf8(output.stdout)
        .map_err(|e| CaptureError::InvalidResponse(format!("Invalid slurp output: {}", e)))?;

    let geometry = geometry.trim();
    if geometry.is_empty() {
        return Err(CaptureError::Cancelled(
            "slurp returned empty geometry".into(),
        ));
    }

    Ok(geometry.to_string())
}

/// Let the user select a region with `slurp` and write it to `target` with
/// `grim`.
pub fn capture_selection(target: &Path) -> Result<(), CaptureError> {
    let geometry = select_geometry()?;

    log::debug!("Capturing region via grim: {}", geometry);
    let output = Command::new("grim")
        .arg("-g")
        .arg(&geometry)
        .arg(target)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| CaptureError::LaunchFailed(format!("Failed to run grim: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::warn!("grim exited with {}: {}", output.status, stderr.trim());
    }

    Ok(())
}
