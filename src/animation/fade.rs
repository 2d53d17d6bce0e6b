use std::{f64::consts::PI, iter::FusedIterator, path::PathBuf};

use crate::{
    encode::sink::{SinkConfig, SinkFactory},
    foundation::error::{MemeError, MemeResult},
    layout::engine::Layout,
    render::surface::{CaptionSurface, TextStyle, draw_text_layer},
};

/// One step of a fade cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub index: u32,
    /// Text layer opacity in `[0, 1]`.
    pub opacity: f32,
}

/// `|sin(pi * index / frame_count)|`: one half period over the frame range, so the text
/// fades in from ~0, peaks mid-cycle, and fades back out for any frame count.
pub fn fade_opacity(index: u32, frame_count: u32) -> f32 {
    if frame_count == 0 {
        return 0.0;
    }
    let t = f64::from(index) / f64::from(frame_count);
    ((PI * t).sin().abs() as f32).clamp(0.0, 1.0)
}

/// Lazy, single-pass frame sequence for one encoder session.
#[derive(Clone, Debug)]
pub struct FadeFrames<'a> {
    layout: &'a Layout,
    next: u32,
    frame_count: u32,
}

impl<'a> FadeFrames<'a> {
    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }
}

impl Iterator for FadeFrames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        if self.next >= self.frame_count {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(Frame {
            index,
            opacity: fade_opacity(index, self.frame_count),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.frame_count - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for FadeFrames<'_> {}

impl FusedIterator for FadeFrames<'_> {}

pub fn render_frames(layout: &Layout, frame_count: u32) -> FadeFrames<'_> {
    FadeFrames {
        layout,
        next: 0,
        frame_count,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationSummary {
    pub path: PathBuf,
    pub frames: u32,
}

/// Render a fade cycle of `layout` over the surface's base image into a fresh sink.
///
/// The text layer is drawn once; each frame only re-composites it at that frame's opacity.
/// Any failure, including failing to open the sink, is reported as an encoding error and the
/// output file must be treated as garbage.
#[tracing::instrument(skip_all, fields(frames = frame_count, out = %sink_cfg.out_path.display()))]
pub fn animate(
    surface: &mut dyn CaptionSurface,
    layout: &Layout,
    style: &TextStyle,
    frame_count: u32,
    sinks: &mut dyn SinkFactory,
    sink_cfg: &SinkConfig,
) -> MemeResult<AnimationSummary> {
    if frame_count == 0 {
        return Err(MemeError::validation("frame count must be >= 1"));
    }

    let mut sink = sinks
        .open(sink_cfg)
        .map_err(|e| as_encoding("open animation sink", e))?;

    draw_text_layer(surface, layout, style)?;

    let mut frames = render_frames(layout, frame_count);
    for frame in frames.by_ref() {
        let rgba = surface.compose(frame.opacity)?;
        sink.encode_frame(&rgba)
            .map_err(|e| as_encoding(&format!("encode frame {}", frame.index), e))?;
    }
    sink.finish()
        .map_err(|e| as_encoding("finish animation", e))?;

    tracing::debug!(frames = frame_count, "animation encoded");
    Ok(AnimationSummary {
        path: sink_cfg.out_path.clone(),
        frames: frame_count,
    })
}

fn as_encoding(what: &str, err: MemeError) -> MemeError {
    match err {
        MemeError::Encoding(_) => err,
        other => MemeError::encoding(format!("{what}: {other}")),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/fade.rs"]
mod tests;
