//! Shared types: errors, canvas and colors, configuration, languages.

pub mod config;
pub mod core;
pub mod error;
pub mod language;
