use std::path::{Path, PathBuf};

use crate::capture::{portal, types::CaptureError};

use super::reader::move_portal_file;

/// Capture through xdg-desktop-portal and place the result at `target`
/// without blocking the Tokio runtime.
pub async fn capture_via_portal_to(target: &Path) -> Result<(), CaptureError> {
    let uri = portal::capture_via_portal().await?;
    let target: PathBuf = target.to_path_buf();

    tokio::task::spawn_blocking(move || move_portal_file(&uri, &target))
        .await
        .map_err(|e| CaptureError::Task(format!("Portal reader task failed: {}", e)))?
}
