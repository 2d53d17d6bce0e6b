use std::path::Path;

use anyhow::Context as _;

use crate::{
    assets::decode::PreparedImage,
    foundation::{
        core::{Canvas, Rgba8},
        error::{MemeError, MemeResult},
    },
    layout::engine::TextMeasure,
    render::{
        composite::over_in_place,
        surface::{CaptionSurface, FrameRGBA, TextStyle},
    },
};

struct LoadedFont {
    family: String,
    data: vello_cpu::peniko::FontData,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
}

#[derive(Clone, Copy, Debug)]
enum Paint {
    Stroke(f32),
    Fill,
}

/// CPU caption surface: parley shapes and measures, vello_cpu rasterizes glyph outlines.
///
/// The text layer is rasterized lazily on the first [`CaptionSurface::compose`] after a change
/// and reused until the next text call.
pub struct CpuSurface {
    canvas: Canvas,
    width: u16,
    height: u16,
    font: Option<LoadedFont>,
    base: Vec<u8>,
    text_ctx: vello_cpu::RenderContext,
    text_layer: Vec<u8>,
    text_dirty: bool,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("canvas", &self.canvas)
            .field("font_family", &self.font_family())
            .field("text_dirty", &self.text_dirty)
            .finish()
    }
}

impl CpuSurface {
    pub fn new(canvas: Canvas) -> MemeResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| MemeError::validation("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| MemeError::validation("canvas height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(MemeError::validation("canvas width/height must be non-zero"));
        }

        Ok(Self {
            canvas,
            width,
            height,
            font: None,
            base: vec![0u8; canvas.pixel_len()],
            text_ctx: vello_cpu::RenderContext::new(width, height),
            text_layer: vec![0u8; canvas.pixel_len()],
            text_dirty: false,
        })
    }

    pub fn with_font_file(canvas: Canvas, path: &Path) -> MemeResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        let mut surface = Self::new(canvas)?;
        surface.load_font(bytes)?;
        Ok(surface)
    }

    /// Register a TrueType/OpenType font; its first family is used for every caption.
    pub fn load_font(&mut self, font_bytes: Vec<u8>) -> MemeResult<()> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| MemeError::measurement("no font families registered from font bytes"))?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| MemeError::measurement("registered font family has no name"))?
            .to_string();

        tracing::debug!(%family, "caption font loaded");
        self.font = Some(LoadedFont {
            family,
            data: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0),
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
        });
        Ok(())
    }

    pub fn font_family(&self) -> Option<&str> {
        self.font.as_ref().map(|f| f.family.as_str())
    }

    fn shape(&mut self, text: &str, font_size: u32) -> MemeResult<parley::Layout<()>> {
        let font = self
            .font
            .as_mut()
            .ok_or_else(|| MemeError::measurement("no caption font loaded"))?;
        if font_size == 0 {
            return Err(MemeError::measurement("font size must be > 0"));
        }

        let mut builder = font
            .layout_ctx
            .ranged_builder(&mut font.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(font.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font_size as f32));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    fn draw_text(
        &mut self,
        text: &str,
        center_x: f32,
        baseline_y: f32,
        font_size: u32,
        color: Rgba8,
        paint: Paint,
    ) -> MemeResult<()> {
        let layout = self.shape(text, font_size)?;
        let Some(first) = layout.lines().next() else {
            return Ok(());
        };
        let dx = center_x - layout.width() / 2.0;
        let dy = baseline_y - first.metrics().baseline;

        let font = self
            .font
            .as_ref()
            .ok_or_else(|| MemeError::measurement("no caption font loaded"))?;
        let ctx = &mut self.text_ctx;

        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            f64::from(dx),
            f64::from(dy),
        )));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        if let Paint::Stroke(width) = paint {
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(f64::from(width)));
        }

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                let builder = ctx.glyph_run(&font.data).font_size(run.run().font_size());
                match paint {
                    Paint::Fill => builder.fill_glyphs(glyphs),
                    Paint::Stroke(_) => builder.stroke_glyphs(glyphs),
                }
            }
        }

        self.text_dirty = true;
        Ok(())
    }

    fn rasterize_text_layer(&mut self) {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.text_ctx.flush();
        self.text_ctx.render_to_pixmap(&mut pixmap);
        self.text_layer.clear();
        self.text_layer.extend_from_slice(pixmap.data_as_u8_slice());
        self.text_dirty = false;
    }
}

impl TextMeasure for CpuSurface {
    fn measure_width(&mut self, text: &str, font_size: u32) -> MemeResult<f32> {
        Ok(self.shape(text, font_size)?.width())
    }
}

impl CaptionSurface for CpuSurface {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn draw_image(&mut self, image: &PreparedImage) -> MemeResult<()> {
        if image.width != self.canvas.width || image.height != self.canvas.height {
            return Err(MemeError::validation(format!(
                "base image is {}x{}, canvas is {}x{}",
                image.width, image.height, self.canvas.width, self.canvas.height
            )));
        }
        if image.rgba8_premul.len() != self.base.len() {
            return Err(MemeError::validation("prepared image byte length mismatch"));
        }
        self.base.copy_from_slice(image.rgba8_premul.as_slice());
        Ok(())
    }

    fn draw_stroked_text(
        &mut self,
        text: &str,
        center_x: f32,
        baseline_y: f32,
        font_size: u32,
        style: &TextStyle,
    ) -> MemeResult<()> {
        if style.stroke_width <= 0.0 {
            return Ok(());
        }
        self.draw_text(
            text,
            center_x,
            baseline_y,
            font_size,
            style.stroke,
            Paint::Stroke(style.stroke_width),
        )
    }

    fn draw_filled_text(
        &mut self,
        text: &str,
        center_x: f32,
        baseline_y: f32,
        font_size: u32,
        style: &TextStyle,
    ) -> MemeResult<()> {
        self.draw_text(
            text,
            center_x,
            baseline_y,
            font_size,
            style.fill,
            Paint::Fill,
        )
    }

    fn clear_text(&mut self) {
        self.text_ctx = vello_cpu::RenderContext::new(self.width, self.height);
        self.text_layer.iter_mut().for_each(|b| *b = 0);
        self.text_dirty = false;
    }

    fn compose(&mut self, opacity: f32) -> MemeResult<FrameRGBA> {
        if self.text_dirty {
            self.rasterize_text_layer();
        }
        let mut data = self.base.clone();
        over_in_place(&mut data, &self.text_layer, opacity)?;
        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data,
            premultiplied: true,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
