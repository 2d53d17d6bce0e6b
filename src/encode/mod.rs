//! Animation sinks.
//!
//! Sinks consume composed frames in order and write one animated artifact.

/// `ffmpeg`-based MP4 sink.
pub mod ffmpeg;
/// GIF sink on the `image` crate encoder.
pub mod gif;
/// Sink trait, output format and sink configuration.
pub mod sink;
