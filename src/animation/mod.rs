/// Fade-in/fade-out frame sequences and their encoding loop.
pub mod fade;
