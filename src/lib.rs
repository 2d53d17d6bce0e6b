//! memeloop renders short captions onto a base image.
//!
//! One [`CompositionRequest`] produces two artifacts from a single resolved [`Layout`]:
//!
//! - a still PNG with the caption at full opacity
//! - a looping animation (GIF, or MP4 through `ffmpeg`) where the caption fades in and out
//!
//! Trending mode ([`TrendingRun`]) picks the caption's topic from an external candidate list,
//! drops unsafe and recently used topics, and records the topic in a [`TopicLedger`] once
//! both artifacts exist.
#![forbid(unsafe_code)]

pub mod animation;
pub mod assets;
pub mod encode;
pub mod foundation;
pub mod layout;
pub mod pipeline;
pub mod render;
pub mod topics;

pub use crate::animation::fade::{AnimationSummary, Frame, animate, fade_opacity, render_frames};
pub use crate::encode::sink::{AnimationFormat, FileSinkFactory, FrameSink, SinkConfig, SinkFactory};
pub use crate::foundation::config::MemeConfig;
pub use crate::foundation::core::{Canvas, Rgba8, TextPosition};
pub use crate::foundation::error::{MemeError, MemeResult};
pub use crate::foundation::language::Language;
pub use crate::layout::engine::{Layout, LayoutRequest, LayoutTuning, TextMeasure, compute_layout};
pub use crate::pipeline::compose::{
    ArtifactPaths, CompositionOutput, CompositionPipeline, CompositionRequest,
};
pub use crate::pipeline::trending::{CaptionSource, TemplateCaption, TrendingOutput, TrendingRun};
pub use crate::render::cpu::CpuSurface;
pub use crate::render::surface::{CaptionSurface, FrameRGBA, TextStyle};
pub use crate::topics::ledger::{TopicLedger, WindowedLedger};
pub use crate::topics::selector::{TopicChoice, TopicSelector, TopicSource};
pub use crate::topics::store::{JsonFileStore, LedgerStore};
