/// Font sizing, word wrapping and vertical placement of captions.
pub mod engine;
