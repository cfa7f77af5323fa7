use std::{fs, path::Path, thread, time::Duration};

use crate::capture::types::CaptureError;

/// Copy the file behind a portal `file://` URI into `target`, then remove
/// the portal's copy.
///
/// Percent-encoded URIs (spaces, non-ASCII) are decoded. Some portals write
/// asynchronously, so an empty or missing file is retried briefly.
pub fn move_portal_file(uri: &str, target: &Path) -> Result<(), CaptureError> {
    let url = url::Url::parse(uri)
        .map_err(|e| CaptureError::InvalidResponse(format!("Invalid file URI '{}': {}", uri, e)))?;

    let path = url.to_file_path().map_err(|_| {
        CaptureError::InvalidResponse(format!("Cannot convert URI to path: {}", uri))
    })?;

    log::debug!("Reading portal screenshot from: {}", path.display());

    const MAX_ATTEMPTS: usize = 60; // up to 3 seconds total
    const ATTEMPT_DELAY_MS: u64 = 50;

    let mut data = Vec::new();
    for attempt in 0..MAX_ATTEMPTS {
        match fs::read(&path) {
            Ok(bytes) if !bytes.is_empty() => {
                data = bytes;
                break;
            }
            Ok(_) => {
                log::trace!(
                    "Portal screenshot file {} still empty (attempt {}/{})",
                    path.display(),
                    attempt + 1,
                    MAX_ATTEMPTS
                );
            }
            Err(e) => {
                log::trace!(
                    "Portal screenshot file {} not ready yet (attempt {}/{}): {}",
                    path.display(),
                    attempt + 1,
                    MAX_ATTEMPTS,
                    e
                );
            }
        }

        if attempt + 1 == MAX_ATTEMPTS {
            return Err(CaptureError::InvalidResponse(format!(
                "Portal screenshot file {} not ready after {} attempts",
                path.display(),
                MAX_ATTEMPTS
            )));
        }

        thread::sleep(Duration::from_millis(ATTEMPT_DELAY_MS));
    }

    fs::write(target, &data)?;
    log::info!(
        "Copied {} bytes of portal screenshot to {}",
        data.len(),
        target.display()
    );

    if let Err(e) = fs::remove_file(&path) {
        log::warn!(
            "Failed to remove portal temp file {}: {}",
            path.display(),
            e
        );
    }

    Ok(())
}
