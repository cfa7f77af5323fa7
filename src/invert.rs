//! Color inversion for captured images.
//!
//! Every color channel is replaced by its complement (`1.0 - value` in
//! normalized terms, `max - value` for integer samples) while alpha is left
//! untouched. No color-space conversion, dithering, or gamma correction is
//! applied.

use image::{DynamicImage, ImageFormat, Rgba};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while decoding, inverting, or encoding an image.
#[derive(Debug, Error)]
pub enum InvertError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode {format:?} image: {source}")]
    Encode {
        format: ImageFormat,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot write {path}: only .png and .tiff outputs are supported")]
    UnsupportedOutput { path: PathBuf },

    #[error("Image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Invert a single 8-bit RGBA pixel.
pub fn invert_pixel(pixel: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    Rgba([u8::MAX - r, u8::MAX - g, u8::MAX - b, a])
}

/// Invert the color channels of `image` in place, keeping its bit depth.
pub fn invert_image(image: &mut DynamicImage) {
    image.invert();
}

/// An image whose colors have already been inverted.
#[derive(Debug, Clone)]
pub struct InvertedImage {
    image: DynamicImage,
}

impl InvertedImage {
    /// Invert `image` and take ownership of the result.
    pub fn from_source(mut image: DynamicImage) -> Result<Self, InvertError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(InvertError::Empty {
                width: image.width(),
                height: image.height(),
            });
        }
        invert_image(&mut image);
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    /// Encode the inverted image into an in-memory buffer.
    ///
    /// Floating point images are widened to 16-bit integers first since
    /// neither PNG nor TIFF encoders accept `f32` samples. The TIFF encoder
    /// has no gray+alpha layout, so those images are expanded to RGBA.
    pub fn encode(&self, format: ImageFormat) -> Result<Vec<u8>, InvertError> {
        let image = match (&self.image, format) {
            (DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_), _)
            | (DynamicImage::ImageLumaA16(_), ImageFormat::Tiff) => {
                Cow::Owned(DynamicImage::ImageRgba16(self.image.to_rgba16()))
            }
            (DynamicImage::ImageLumaA8(_), ImageFormat::Tiff) => {
                Cow::Owned(DynamicImage::ImageRgba8(self.image.to_rgba8()))
            }
            (other, _) => Cow::Borrowed(other),
        };
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, format)
            .map_err(|source| InvertError::Encode { format, source })?;
        Ok(buffer.into_inner())
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, InvertError> {
        self.encode(ImageFormat::Png)
    }

    pub fn encode_tiff(&self) -> Result<Vec<u8>, InvertError> {
        self.encode(ImageFormat::Tiff)
    }

    /// Write the image to `path` as PNG or TIFF, picking the format from its
    /// extension. A path without an extension is written as PNG.
    pub fn save(&self, path: &Path) -> Result<(), InvertError> {
        let format = match path.extension() {
            None => ImageFormat::Png,
            Some(_) => match ImageFormat::from_path(path) {
                Ok(format @ (ImageFormat::Png | ImageFormat::Tiff)) => format,
                _ => {
                    return Err(InvertError::UnsupportedOutput {
                        path: path.to_path_buf(),
                    });
                }
            },
        };
        let bytes = self.encode(format)?;
        std::fs::write(path, bytes).map_err(|source| InvertError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Decode an in-memory image and invert it.
pub fn invert_bytes(bytes: &[u8]) -> Result<InvertedImage, InvertError> {
    let image = image::load_from_memory(bytes).map_err(InvertError::Decode)?;
    InvertedImage::from_source(image)
}

/// Read the image at `path`, decode it, and invert it.
pub fn load_and_invert(path: &Path) -> Result<InvertedImage, InvertError> {
    let bytes = std::fs::read(path).map_err(|source| InvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "Decoding {} ({} bytes) for inversion",
        path.display(),
        bytes.len()
    );
    invert_bytes(&bytes)
}
