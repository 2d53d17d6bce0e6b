use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context as _;

use crate::{
    encode::{ffmpeg::FfmpegSink, gif::GifSink},
    foundation::{
        core::Canvas,
        error::{MemeError, MemeResult},
    },
    render::surface::FrameRGBA,
};

/// Container for the animated artifact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationFormat {
    #[default]
    Gif,
    /// H.264 through the system `ffmpeg` binary.
    Mp4,
}

impl AnimationFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Mp4 => "mp4",
        }
    }
}

impl FromStr for AnimationFormat {
    type Err = MemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gif" => Ok(Self::Gif),
            "mp4" => Ok(Self::Mp4),
            other => Err(MemeError::validation(format!(
                "unknown animation format '{other}' (expected gif or mp4)"
            ))),
        }
    }
}

impl fmt::Display for AnimationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Clone, Debug)]
pub struct SinkConfig {
    pub format: AnimationFormat,
    pub canvas: Canvas,
    pub out_path: PathBuf,
    pub frame_delay_ms: u32,
    /// Frames are flattened over this color before encoding.
    pub bg_rgba: [u8; 4],
    pub overwrite: bool,
}

impl SinkConfig {
    pub fn new(format: AnimationFormat, canvas: Canvas, out_path: impl Into<PathBuf>) -> Self {
        Self {
            format,
            canvas,
            out_path: out_path.into(),
            frame_delay_ms: 100,
            bg_rgba: [0, 0, 0, 255],
            overwrite: true,
        }
    }

    pub fn with_frame_delay_ms(mut self, frame_delay_ms: u32) -> Self {
        self.frame_delay_ms = frame_delay_ms;
        self
    }

    pub fn validate(&self) -> MemeResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(MemeError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.frame_delay_ms == 0 {
            return Err(MemeError::validation("frame delay must be non-zero"));
        }
        if self.format == AnimationFormat::Mp4
            && (!self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2))
        {
            return Err(MemeError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }

    pub(crate) fn check_frame(&self, frame: &FrameRGBA) -> MemeResult<()> {
        if frame.width != self.canvas.width || frame.height != self.canvas.height {
            return Err(MemeError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.canvas.width, self.canvas.height
            )));
        }
        if frame.data.len() != self.canvas.pixel_len() {
            return Err(MemeError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        Ok(())
    }

    pub(crate) fn prepare_output(&self) -> MemeResult<()> {
        ensure_parent_dir(&self.out_path)?;
        if !self.overwrite && self.out_path.exists() {
            return Err(MemeError::validation(format!(
                "output file '{}' already exists",
                self.out_path.display()
            )));
        }
        Ok(())
    }
}

/// Ordered consumer of animation frames.
///
/// `finish` consumes the sink; a sink dropped without `finish` may leave a truncated file.
pub trait FrameSink {
    fn encode_frame(&mut self, frame: &FrameRGBA) -> MemeResult<()>;

    fn finish(self: Box<Self>) -> MemeResult<()>;
}

/// Opens sinks for the composition pipeline.
pub trait SinkFactory {
    fn open(&mut self, cfg: &SinkConfig) -> MemeResult<Box<dyn FrameSink>>;
}

/// Opens file-backed sinks with [`open_sink`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSinkFactory;

impl SinkFactory for FileSinkFactory {
    fn open(&mut self, cfg: &SinkConfig) -> MemeResult<Box<dyn FrameSink>> {
        open_sink(cfg)
    }
}

pub fn open_sink(cfg: &SinkConfig) -> MemeResult<Box<dyn FrameSink>> {
    Ok(match cfg.format {
        AnimationFormat::Gif => Box::new(GifSink::new(cfg.clone())?),
        AnimationFormat::Mp4 => Box::new(FfmpegSink::new(cfg.clone())?),
    })
}

pub fn ensure_parent_dir(path: &Path) -> MemeResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
