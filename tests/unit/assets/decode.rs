use std::io::Cursor;

use super::*;

fn png(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_premultiplies() {
    let buf = png(1, 1, [100, 50, 200, 128]);
    let prepared = decode_image(&buf, Canvas::new(1, 1).unwrap()).unwrap();
    assert_eq!(prepared.width, 1);
    assert_eq!(prepared.height, 1);
    assert_eq!(
        prepared.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_image_stretches_to_canvas() {
    let buf = png(3, 5, [10, 20, 30, 255]);
    let prepared = decode_image(&buf, Canvas::new(8, 6).unwrap()).unwrap();
    assert_eq!((prepared.width, prepared.height), (8, 6));
    assert_eq!(prepared.rgba8_premul.len(), 8 * 6 * 4);
    for (got, want) in prepared.rgba8_premul[0..4].iter().zip([10u8, 20, 30, 255]) {
        assert!(got.abs_diff(want) <= 1, "{got} vs {want}");
    }
}

#[test]
fn garbage_bytes_and_missing_files_are_errors() {
    assert!(decode_image(b"not an image", Canvas::default()).is_err());

    let dir = tempfile::tempdir().unwrap();
    let err = load_image(&dir.path().join("missing.png"), Canvas::default()).unwrap_err();
    assert!(matches!(err, MemeError::Validation(_)));
}
