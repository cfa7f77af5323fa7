use blackshot::invert::{InvertError, invert_bytes, load_and_invert};
use image::{DynamicImage, ImageBuffer, ImageFormat, LumaA, Rgba, RgbaImage};
use std::io::Cursor;
use tempfile::TempDir;

fn png_bytes(image: DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn inverting_twice_restores_the_original() {
    let mut source: RgbaImage = ImageBuffer::new(3, 1);
    source.put_pixel(0, 0, Rgba([10, 200, 30, 255]));
    source.put_pixel(1, 0, Rgba([0, 0, 0, 128]));
    source.put_pixel(2, 0, Rgba([255, 255, 255, 0]));

    let once = invert_bytes(&png_bytes(DynamicImage::ImageRgba8(source.clone()))).unwrap();
    let twice = invert_bytes(&once.encode_png().unwrap()).unwrap();

    assert_eq!(twice.as_image().to_rgba8(), source);
}

#[test]
fn alpha_is_preserved_for_gray_images() {
    let source: ImageBuffer<LumaA<u8>, Vec<u8>> = ImageBuffer::from_pixel(2, 2, LumaA([40, 77]));
    let inverted = invert_bytes(&png_bytes(DynamicImage::ImageLumaA8(source))).unwrap();

    let px = inverted.as_image().to_luma_alpha8().get_pixel(1, 1).0;
    assert_eq!(px, [215, 77]);
}

#[test]
fn clipboard_encodings_decode_to_same_pixels() {
    let source: RgbaImage = ImageBuffer::from_pixel(4, 3, Rgba([255, 255, 255, 255]));
    let inverted = invert_bytes(&png_bytes(DynamicImage::ImageRgba8(source))).unwrap();

    let from_png = image::load_from_memory(&inverted.encode_png().unwrap())
        .unwrap()
        .to_rgba8();
    let from_tiff = image::load_from_memory(&inverted.encode_tiff().unwrap())
        .unwrap()
        .to_rgba8();

    assert_eq!(from_png.dimensions(), (4, 3));
    assert_eq!(from_png, from_tiff);
    assert!(from_png.pixels().all(|px| *px == Rgba([0, 0, 0, 255])));
}

#[test]
fn garbage_bytes_fail_to_decode() {
    let err = invert_bytes(b"definitely not an image").unwrap_err();
    assert!(matches!(err, InvertError::Decode(_)));
}

#[test]
fn load_and_invert_reports_missing_path() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.png");
    let err = load_and_invert(&missing).unwrap_err();
    assert!(matches!(err, InvertError::Read { .. }));
    assert!(err.to_string().contains("nope.png"));
}
