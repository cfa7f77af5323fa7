//! Wayland clipboard backend.

use std::io::Write;
use std::process::{Command, Stdio};

use wl_clipboard_rs::copy::{MimeSource, MimeType, Options, Source};

use super::{ClipboardPayload, file_url};
use crate::capture::types::CaptureError;

/// Publish every representation through wl-clipboard-rs, falling back to a
/// PNG-only `wl-copy` when the library cannot reach the compositor.
pub(super) fn write_payload(payload: &ClipboardPayload) -> Result<(), CaptureError> {
    match copy_via_library(payload) {
        Ok(()) => {
            log::info!("Copied inverted capture to clipboard via wl-clipboard-rs");
            Ok(())
        }
        Err(lib_err) => {
            log::warn!(
                "wl-clipboard-rs failed ({}). Falling back to wl-copy (PNG only)",
                lib_err
            );
            copy_via_command(&payload.png).map_err(|cmd_err| {
                CaptureError::ClipboardError(format!(
                    "wl-clipboard-rs failed: {} ; wl-copy failed: {}",
                    lib_err, cmd_err
                ))
            })?;
            log::info!("Copied inverted capture to clipboard via wl-copy");
            Ok(())
        }
    }
}

fn mime_sources(payload: &ClipboardPayload) -> Result<Vec<MimeSource>, CaptureError> {
    let mut sources = vec![MimeSource {
        source: Source::Bytes(payload.png.clone().into_boxed_slice()),
        mime_type: MimeType::Specific("image/png".to_string()),
    }];

    if let Some(tiff) = &payload.tiff {
        sources.push(MimeSource {
            source: Source::Bytes(tiff.clone().into_boxed_slice()),
            mime_type: MimeType::Specific("image/tiff".to_string()),
        });
    }

    if let Some(path) = &payload.file {
        let uri_list = format!("{}\r\n", file_url(path)?);
        sources.push(MimeSource {
            source: Source::Bytes(uri_list.into_bytes().into_boxed_slice()),
            mime_type: MimeType::Specific("text/uri-list".to_string()),
        });
    }

    Ok(sources)
}

fn copy_via_library(payload: &ClipboardPayload) -> Result<(), CaptureError> {
    let sources = mime_sources(payload)?;

    // The default options fork a server that keeps the data available until
    // another client takes the selection.
    Options::new()
        .copy_multi(sources)
        .map_err(|e| CaptureError::ClipboardError(format!("wl-clipboard-rs error: {}", e)))
}

fn copy_via_command(image_data: &[u8]) -> Result<(), CaptureError> {
    let mut child = Command::new("wl-copy")
        .arg("--type")
        .arg("image/png")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            CaptureError::ClipboardError(format!(
                "Failed to spawn wl-copy (is it installed?): {}",
                e
            ))
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(image_data).map_err(|e| {
            CaptureError::ClipboardError(format!("Failed to write to wl-copy stdin: {}", e))
        })?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| CaptureError::ClipboardError(format!("Failed to wait for wl-copy: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CaptureError::ClipboardError(format!(
            "wl-copy failed: {}",
            stderr.trim()
        )));
    }

    Ok(())
}
