//! Still + animation composition, and the trending-topic run built on it.

pub mod compose;
pub mod trending;
