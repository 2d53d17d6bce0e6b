use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    animation::fade::{AnimationSummary, animate},
    assets::decode::load_image,
    encode::sink::{AnimationFormat, FileSinkFactory, SinkConfig, SinkFactory, ensure_parent_dir},
    foundation::{
        config::MemeConfig,
        core::{Rgba8, TextPosition},
        error::{MemeError, MemeResult},
    },
    layout::engine::{Layout, LayoutRequest, clean_caption, compute_layout},
    render::{
        composite::flatten_to_opaque_rgba8,
        surface::{CaptionSurface, FrameRGBA, TextStyle, draw_text_layer},
    },
};

/// One caption on one base image. Caller-owned; the pipeline only reads it.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositionRequest {
    pub source_image: PathBuf,
    pub caption: String,
    pub text_color: Rgba8,
    pub position: TextPosition,
    /// Upper bound for the font size search.
    pub font_size: u32,
    pub max_width: u32,
    pub frame_count: u32,
    pub frame_delay_ms: u32,
    pub format: AnimationFormat,
}

impl CompositionRequest {
    pub fn from_config(
        cfg: &MemeConfig,
        source_image: impl Into<PathBuf>,
        caption: impl Into<String>,
    ) -> Self {
        Self {
            source_image: source_image.into(),
            caption: caption.into(),
            text_color: cfg.text.fill,
            position: TextPosition::default(),
            font_size: cfg.text.max_font_size,
            max_width: cfg.text.max_width,
            frame_count: cfg.animation.frame_count,
            frame_delay_ms: cfg.animation.frame_delay_ms,
            format: cfg.animation.format,
        }
    }

    pub fn validate(&self) -> MemeResult<()> {
        if self.font_size == 0 {
            return Err(MemeError::validation("font size must be > 0"));
        }
        if self.max_width == 0 {
            return Err(MemeError::validation("max width must be > 0"));
        }
        if self.frame_count == 0 {
            return Err(MemeError::validation("frame count must be >= 1"));
        }
        if self.frame_delay_ms == 0 {
            return Err(MemeError::validation("animation delay must be > 0"));
        }
        Ok(())
    }
}

/// Where the two artifacts of one composition land.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub still: PathBuf,
    pub animation: PathBuf,
}

impl ArtifactPaths {
    /// `meme-<now_ms>.png` plus `meme-<now_ms>.<format>` under `out_dir`.
    pub fn timestamped(out_dir: &Path, format: AnimationFormat, now_ms: u64) -> Self {
        let stem = format!("meme-{now_ms}");
        Self {
            still: out_dir.join(format!("{stem}.png")),
            animation: out_dir.join(format!("{stem}.{}", format.extension())),
        }
    }
}

#[derive(Debug)]
pub struct CompositionOutput {
    /// The single layout both artifacts were rendered with.
    pub layout: Layout,
    pub still: PathBuf,
    /// The animation degrades independently of the still.
    pub animation: MemeResult<AnimationSummary>,
}

impl CompositionOutput {
    pub fn is_complete(&self) -> bool {
        self.animation.is_ok()
    }
}

/// Still + animation from one base image and one caption.
pub struct CompositionPipeline<F = FileSinkFactory> {
    cfg: MemeConfig,
    sinks: F,
}

impl CompositionPipeline<FileSinkFactory> {
    pub fn new(cfg: MemeConfig) -> MemeResult<Self> {
        Self::with_sinks(cfg, FileSinkFactory)
    }
}

impl<F: SinkFactory> CompositionPipeline<F> {
    pub fn with_sinks(cfg: MemeConfig, sinks: F) -> MemeResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg, sinks })
    }

    pub fn config(&self) -> &MemeConfig {
        &self.cfg
    }

    pub fn sinks(&self) -> &F {
        &self.sinks
    }

    /// Caption text as it will be drawn: unquoted, trimmed and optionally upper-cased.
    pub fn render_text(&self, caption: &str) -> String {
        let cleaned = clean_caption(caption);
        if self.cfg.uppercase {
            cleaned.to_uppercase()
        } else {
            cleaned
        }
    }

    /// Resolve the layout of `req` against the surface's font and canvas.
    pub fn layout(
        &self,
        surface: &mut dyn CaptionSurface,
        req: &CompositionRequest,
    ) -> MemeResult<Layout> {
        let text = self.render_text(&req.caption);
        let canvas = surface.canvas();
        let layout_req = LayoutRequest {
            text: &text,
            max_width: req.max_width,
            max_font_size: req.font_size,
            min_font_size: self.cfg.text.min_font_size.min(req.font_size),
            canvas_height: canvas.height,
            position: req.position,
        };
        compute_layout(surface, &layout_req, &self.cfg.layout)
    }

    /// Render the still, then the animation, both from one resolved layout.
    ///
    /// Fails only when the still cannot be produced (missing base image, no text
    /// measurement, unwritable output). An animation failure is returned inside the output
    /// and its partial file is removed.
    #[tracing::instrument(skip_all, fields(source = %req.source_image.display(), format = %req.format))]
    pub fn compose(
        &mut self,
        surface: &mut dyn CaptionSurface,
        req: &CompositionRequest,
        paths: &ArtifactPaths,
    ) -> MemeResult<CompositionOutput> {
        req.validate()?;

        let canvas = surface.canvas();
        let base = load_image(&req.source_image, canvas)?;
        surface.draw_image(&base)?;

        let layout = self.layout(surface, req)?;
        let style = TextStyle {
            fill: req.text_color,
            stroke: self.cfg.text.stroke,
            stroke_width: self.cfg.text.stroke_width,
        };

        draw_text_layer(surface, &layout, &style)?;
        let still = surface.compose(1.0)?;
        write_png(&paths.still, &still)?;
        tracing::info!(path = %paths.still.display(), lines = layout.line_count(), "still written");

        let sink_cfg = SinkConfig::new(req.format, canvas, &paths.animation)
            .with_frame_delay_ms(req.frame_delay_ms);
        let animation = animate(
            surface,
            &layout,
            &style,
            req.frame_count,
            &mut self.sinks,
            &sink_cfg,
        );
        match &animation {
            Ok(summary) => {
                tracing::info!(path = %summary.path.display(), frames = summary.frames, "animation written");
            }
            Err(err) => {
                tracing::warn!(error = %err, "animation failed, keeping still only");
                discard_partial(&paths.animation);
            }
        }

        Ok(CompositionOutput {
            layout,
            still: paths.still.clone(),
            animation,
        })
    }
}

fn discard_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "partial animation removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove partial animation"),
    }
}

/// Write `frame` as an opaque PNG.
pub fn write_png(path: &Path, frame: &FrameRGBA) -> MemeResult<()> {
    ensure_parent_dir(path)?;
    let mut rgba = vec![0u8; frame.data.len()];
    flatten_to_opaque_rgba8(&mut rgba, &frame.data, frame.premultiplied, [0, 0, 0, 255])?;
    image::save_buffer_with_format(
        path,
        &rgba,
        frame.width,
        frame.height,
        image::ExtendedColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/compose.rs"]
mod tests;
