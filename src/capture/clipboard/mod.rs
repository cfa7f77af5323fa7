//! Clipboard publishing for inverted captures.
//!
//! The payload always carries PNG bytes, optionally TIFF bytes, and
//! optionally a staged file offered as a file reference. Each platform
//! backend clears the clipboard and writes every representation at once.

use std::path::{Path, PathBuf};

use super::types::{CaptureError, ClipboardFormat};
use crate::invert::InvertedImage;

#[cfg(target_os = "macos")]
mod pasteboard;
#[cfg(target_os = "linux")]
mod wayland;

/// Encoded representations of one inverted image.
#[derive(Debug, Clone)]
pub struct ClipboardPayload {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
    pub tiff: Option<Vec<u8>>,
    pub file: Option<PathBuf>,
}

impl ClipboardPayload {
    /// Encode `image` to PNG, and to TIFF when `include_tiff` is set.
    ///
    /// PNG is mandatory. A TIFF failure only drops that representation.
    pub fn encode(image: &InvertedImage, include_tiff: bool) -> Result<Self, CaptureError> {
        let png = image.encode_png().map_err(CaptureError::Encode)?;
        let tiff = if include_tiff {
            match image.encode_tiff() {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    log::warn!("Publishing PNG only, TIFF encoding failed: {}", err);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            width: image.width(),
            height: image.height(),
            png,
            tiff,
            file: None,
        })
    }

    /// Offer `path` as a file reference alongside the image data.
    pub fn with_file(mut self, path: PathBuf) -> Self {
        self.file = Some(path);
        self
    }

    pub fn formats(&self) -> Vec<ClipboardFormat> {
        let mut formats = vec![ClipboardFormat::Png];
        if self.tiff.is_some() {
            formats.push(ClipboardFormat::Tiff);
        }
        if self.file.is_some() {
            formats.push(ClipboardFormat::FileReference);
        }
        formats
    }
}

/// `file://` URL for a staged file, percent-encoded.
pub fn file_url(path: &Path) -> Result<String, CaptureError> {
    url::Url::from_file_path(path)
        .map(|url| url.to_string())
        .map_err(|_| {
            CaptureError::ClipboardError(format!(
                "Cannot express {} as a file URL",
                path.display()
            ))
        })
}

/// Replace the system clipboard contents with `payload`.
pub fn copy_to_clipboard(payload: &ClipboardPayload) -> Result<(), CaptureError> {
    log::debug!(
        "Publishing {}x{} image to clipboard as {:?}",
        payload.width,
        payload.height,
        payload.formats()
    );

    #[cfg(target_os = "macos")]
    {
        pasteboard::write_payload(payload)
    }

    #[cfg(target_os = "linux")]
    {
        wayland::write_payload(payload)
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        Err(CaptureError::ClipboardError(
            "Clipboard publishing is not supported on this platform".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn sample() -> InvertedImage {
        let source = RgbaImage::from_pixel(4, 2, Rgba([200, 100, 50, 255]));
        InvertedImage::from_source(DynamicImage::ImageRgba8(source)).unwrap()
    }

    #[test]
    fn png_only_payload() {
        let payload = ClipboardPayload::encode(&sample(), false).unwrap();
        assert_eq!(payload.formats(), vec![ClipboardFormat::Png]);
        assert_eq!(&payload.png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        assert_eq!((payload.width, payload.height), (4, 2));
    }

    #[test]
    fn all_formats_payload() {
        let payload = ClipboardPayload::encode(&sample(), true)
            .unwrap()
            .with_file(PathBuf::from("/tmp/blackshot_inverted.png"));
        assert_eq!(
            payload.formats(),
            vec![
                ClipboardFormat::Png,
                ClipboardFormat::Tiff,
                ClipboardFormat::FileReference
            ]
        );
        let tiff = payload.tiff.as_ref().unwrap();
        assert!(tiff.starts_with(b"II") || tiff.starts_with(b"MM"));
    }

    #[cfg(unix)]
    #[test]
    fn file_url_percent_encodes() {
        let url = file_url(Path::new("/tmp/with space.png")).unwrap();
        assert_eq!(url, "file:///tmp/with%20space.png");
    }

    #[test]
    fn relative_paths_have_no_file_url() {
        assert!(file_url(Path::new("relative.png")).is_err());
    }
}
