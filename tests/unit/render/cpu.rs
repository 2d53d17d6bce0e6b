use std::sync::Arc;

use super::*;

const FONT_PATH: &str = "tests/data/fonts/Inconsolata-Regular.ttf";

fn font_bytes() -> Option<Vec<u8>> {
    std::fs::read(FONT_PATH).ok()
}

fn solid(canvas: Canvas, px: [u8; 4]) -> PreparedImage {
    PreparedImage {
        width: canvas.width,
        height: canvas.height,
        rgba8_premul: Arc::new(px.repeat(canvas.pixel_len() / 4)),
    }
}

#[test]
fn measuring_without_a_font_is_unavailable() {
    let mut surface = CpuSurface::new(Canvas::new(16, 16).unwrap()).unwrap();
    let err = surface.measure_width("hello", 32).unwrap_err();
    assert!(matches!(err, MemeError::MeasurementUnavailable(_)));
}

#[test]
fn oversized_canvas_is_rejected() {
    let err = CpuSurface::new(Canvas::new(70_000, 16).unwrap()).unwrap_err();
    assert!(matches!(err, MemeError::Validation(_)));
}

#[test]
fn garbage_font_bytes_are_rejected() {
    let mut surface = CpuSurface::new(Canvas::new(16, 16).unwrap()).unwrap();
    assert!(surface.load_font(b"definitely not a font".to_vec()).is_err());
    assert!(surface.font_family().is_none());
}

#[test]
fn compose_without_text_returns_the_base_image() {
    let canvas = Canvas::new(4, 3).unwrap();
    let mut surface = CpuSurface::new(canvas).unwrap();
    surface.draw_image(&solid(canvas, [10, 20, 30, 255])).unwrap();

    let frame = surface.compose(1.0).unwrap();
    assert_eq!((frame.width, frame.height), (4, 3));
    assert!(frame.premultiplied);
    assert!(frame.data.chunks_exact(4).all(|px| px == [10, 20, 30, 255]));
}

#[test]
fn base_image_must_match_canvas() {
    let mut surface = CpuSurface::new(Canvas::new(4, 4).unwrap()).unwrap();
    let err = surface
        .draw_image(&solid(Canvas::new(2, 2).unwrap(), [0, 0, 0, 255]))
        .unwrap_err();
    assert!(matches!(err, MemeError::Validation(_)));
}

#[test]
fn measured_width_grows_with_text_and_size() {
    let Some(bytes) = font_bytes() else {
        return;
    };
    let mut surface = CpuSurface::new(Canvas::new(64, 64).unwrap()).unwrap();
    surface.load_font(bytes).unwrap();
    assert!(!surface.font_family().unwrap().trim().is_empty());

    let short = surface.measure_width("HI", 40).unwrap();
    let long = surface.measure_width("HI THERE", 40).unwrap();
    let big = surface.measure_width("HI", 80).unwrap();
    assert!(short > 0.0);
    assert!(long > short);
    assert!(big > short);
}

#[test]
fn text_layer_fades_with_opacity() {
    let Some(bytes) = font_bytes() else {
        return;
    };
    let canvas = Canvas::new(128, 64).unwrap();
    let mut surface = CpuSurface::new(canvas).unwrap();
    surface.load_font(bytes).unwrap();
    surface.draw_image(&solid(canvas, [0, 0, 0, 255])).unwrap();

    let style = TextStyle {
        fill: Rgba8::WHITE,
        stroke: Rgba8::BLACK,
        stroke_width: 2.0,
    };
    surface
        .draw_filled_text("MEME", canvas.center_x(), 48.0, 40, &style)
        .unwrap();

    let lit = |f: &FrameRGBA| f.data.chunks_exact(4).filter(|px| px[0] > 0).count();
    let hidden = surface.compose(0.0).unwrap();
    let shown = surface.compose(1.0).unwrap();
    assert_eq!(lit(&hidden), 0);
    assert!(lit(&shown) > 0);

    surface.clear_text();
    assert_eq!(lit(&surface.compose(1.0).unwrap()), 0);
}
