use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    encode::sink::AnimationFormat,
    foundation::core::{Canvas, Rgba8},
    foundation::error::{MemeError, MemeResult},
    layout::engine::LayoutTuning,
    topics::safety::{DEFAULT_DENYLIST, FALLBACK_TOPIC, SAFE_DEFAULT_TOPICS},
};

/// Runtime configuration.
///
/// Resolution order: built-in defaults, then an optional JSON file, then `MEMELOOP_*`
/// environment variables, then whatever the binary applies from its flags.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemeConfig {
    pub canvas: Canvas,
    /// TrueType/OpenType font used for captions.
    pub font_path: Option<PathBuf>,
    pub out_dir: PathBuf,
    /// Render captions upper-cased.
    pub uppercase: bool,
    pub text: TextConfig,
    pub layout: LayoutTuning,
    pub animation: AnimationConfig,
    pub topics: TopicConfig,
}

impl Default for MemeConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            font_path: None,
            out_dir: PathBuf::from("memes"),
            uppercase: true,
            text: TextConfig::default(),
            layout: LayoutTuning::default(),
            animation: AnimationConfig::default(),
            topics: TopicConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextConfig {
    pub fill: Rgba8,
    pub stroke: Rgba8,
    pub stroke_width: f32,
    pub max_width: u32,
    pub max_font_size: u32,
    pub min_font_size: u32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            fill: Rgba8::WHITE,
            stroke: Rgba8::BLACK,
            stroke_width: 8.0,
            max_width: 900,
            max_font_size: 80,
            min_font_size: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    pub frame_count: u32,
    pub frame_delay_ms: u32,
    pub format: AnimationFormat,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_count: 40,
            frame_delay_ms: 100,
            format: AnimationFormat::Gif,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TopicConfig {
    pub ledger_path: PathBuf,
    pub window_hours: u64,
    pub denylist: Vec<String>,
    /// Used when the topic source cannot be reached.
    pub fallback_topic: String,
    /// Picked from when every candidate was filtered out. Never recorded in the ledger.
    pub safe_defaults: Vec<String>,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("used_topics.json"),
            window_hours: 24,
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
            fallback_topic: FALLBACK_TOPIC.to_string(),
            safe_defaults: SAFE_DEFAULT_TOPICS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TopicConfig {
    pub fn window_ms(&self) -> u64 {
        self.window_hours.saturating_mul(60 * 60 * 1000)
    }
}

impl MemeConfig {
    pub fn from_path(path: &Path) -> MemeResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| MemeError::serde(format!("parse config '{}': {e}", path.display())))?;
        Ok(cfg)
    }

    /// Defaults or `path`, then environment overrides.
    pub fn load(path: Option<&Path>) -> MemeResult<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_path(p)?,
            None => Self::default(),
        };
        cfg.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> MemeResult<()> {
        if let Some(v) = lookup("MEMELOOP_FONT_PATH").filter(|v| !v.is_empty()) {
            self.font_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("MEMELOOP_LEDGER_PATH").filter(|v| !v.is_empty()) {
            self.topics.ledger_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("MEMELOOP_OUT_DIR").filter(|v| !v.is_empty()) {
            self.out_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("MEMELOOP_FRAME_COUNT") {
            self.animation.frame_count = parse_env_u32("MEMELOOP_FRAME_COUNT", &v)?;
        }
        if let Some(v) = lookup("MEMELOOP_FRAME_DELAY_MS") {
            self.animation.frame_delay_ms = parse_env_u32("MEMELOOP_FRAME_DELAY_MS", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> MemeResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(MemeError::validation("canvas width/height must be non-zero"));
        }
        if self.text.max_width == 0 {
            return Err(MemeError::validation("text max_width must be non-zero"));
        }
        if self.text.min_font_size == 0 {
            return Err(MemeError::validation("text min_font_size must be non-zero"));
        }
        if self.text.min_font_size > self.text.max_font_size {
            return Err(MemeError::validation(
                "text min_font_size must be <= max_font_size",
            ));
        }
        if !self.text.stroke_width.is_finite() || self.text.stroke_width < 0.0 {
            return Err(MemeError::validation(
                "text stroke_width must be finite and >= 0",
            ));
        }
        self.layout.validate()?;
        if self.animation.frame_count == 0 {
            return Err(MemeError::validation("animation frame_count must be >= 1"));
        }
        if self.animation.frame_delay_ms == 0 {
            return Err(MemeError::validation("animation frame_delay_ms must be >= 1"));
        }
        if self.animation.format == AnimationFormat::Mp4
            && (!self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2))
        {
            return Err(MemeError::validation(
                "canvas width/height must be even for mp4 output (yuv420p)",
            ));
        }
        if self.topics.window_hours == 0 {
            return Err(MemeError::validation("topics window_hours must be >= 1"));
        }
        if self.topics.safe_defaults.is_empty() {
            return Err(MemeError::validation(
                "topics safe_defaults must contain at least one topic",
            ));
        }
        Ok(())
    }
}

fn parse_env_u32(key: &str, value: &str) -> MemeResult<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| MemeError::validation(format!("{key} must be an unsigned integer, got \"{value}\"")))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
