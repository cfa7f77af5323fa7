//! macOS general pasteboard backend.

use objc2_app_kit::{
    NSPasteboard, NSPasteboardTypeFileURL, NSPasteboardTypePNG, NSPasteboardTypeTIFF,
};
use objc2_foundation::{NSData, NSString};

use super::{ClipboardPayload, file_url};
use crate::capture::types::CaptureError;

/// Clear the general pasteboard and write PNG, TIFF and the file URL in one
/// change so readers see a consistent set of representations.
#[allow(unused_unsafe)]
pub(super) fn write_payload(payload: &ClipboardPayload) -> Result<(), CaptureError> {
    let url = payload.file.as_deref().map(file_url).transpose()?;

    let pasteboard = unsafe { NSPasteboard::generalPasteboard() };
    unsafe { pasteboard.clearContents() };

    let png = NSData::with_bytes(&payload.png);
    if !unsafe { pasteboard.setData_forType(Some(&png), NSPasteboardTypePNG) } {
        return Err(CaptureError::ClipboardError(
            "Pasteboard rejected PNG data".to_string(),
        ));
    }

    if let Some(tiff) = &payload.tiff {
        let tiff = NSData::with_bytes(tiff);
        if !unsafe { pasteboard.setData_forType(Some(&tiff), NSPasteboardTypeTIFF) } {
            log::warn!("Pasteboard rejected TIFF data; PNG is still available");
        }
    }

    if let Some(url) = url {
        let url = NSString::from_str(&url);
        if !unsafe { pasteboard.setString_forType(&url, NSPasteboardTypeFileURL) } {
            log::warn!("Pasteboard rejected file URL; image data is still available");
        }
    }

    log::info!(
        "Copied inverted capture to pasteboard ({} bytes PNG)",
        payload.png.len()
    );
    Ok(())
}
