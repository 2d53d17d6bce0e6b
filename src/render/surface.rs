use crate::{
    assets::decode::PreparedImage,
    foundation::{config::TextConfig, core::Canvas, core::Rgba8, error::MemeResult},
    layout::engine::{Layout, TextMeasure},
};

#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub fill: Rgba8,
    pub stroke: Rgba8,
    pub stroke_width: f32,
}

impl From<&TextConfig> for TextStyle {
    fn from(cfg: &TextConfig) -> Self {
        Self {
            fill: cfg.fill,
            stroke: cfg.stroke,
            stroke_width: cfg.stroke_width,
        }
    }
}

/// 2D raster target for captions.
///
/// A surface holds one base image and one text layer. Text calls accumulate into the text
/// layer; [`CaptionSurface::compose`] produces base + text layer at a given opacity without
/// touching either, so one layer serves every frame of an animation.
pub trait CaptionSurface: TextMeasure {
    fn canvas(&self) -> Canvas;

    /// Set the base image. It must already match the canvas size.
    fn draw_image(&mut self, image: &PreparedImage) -> MemeResult<()>;

    /// Outline `text` centered on `center_x` with its baseline at `baseline_y`.
    fn draw_stroked_text(
        &mut self,
        text: &str,
        center_x: f32,
        baseline_y: f32,
        font_size: u32,
        style: &TextStyle,
    ) -> MemeResult<()>;

    /// Fill `text` centered on `center_x` with its baseline at `baseline_y`.
    fn draw_filled_text(
        &mut self,
        text: &str,
        center_x: f32,
        baseline_y: f32,
        font_size: u32,
        style: &TextStyle,
    ) -> MemeResult<()>;

    fn clear_text(&mut self);

    /// Base image with the text layer composited at `opacity`. Premultiplied RGBA8.
    fn compose(&mut self, opacity: f32) -> MemeResult<FrameRGBA>;
}

/// Replace the surface's text layer with `layout`: each line stroked, then filled.
pub fn draw_text_layer(
    surface: &mut dyn CaptionSurface,
    layout: &Layout,
    style: &TextStyle,
) -> MemeResult<()> {
    surface.clear_text();
    let x = surface.canvas().center_x();
    for (line, y) in layout.positioned_lines() {
        if line.is_empty() {
            continue;
        }
        let y = y as f32;
        surface.draw_stroked_text(line, x, y, layout.font_size, style)?;
        surface.draw_filled_text(line, x, y, layout.font_size, style)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
