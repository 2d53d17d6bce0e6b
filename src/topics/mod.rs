//! Trending topic selection with a rolling "already used" window.

pub mod ledger;
pub mod safety;
pub mod selector;
pub mod store;
