//! File discovery and per-file cleaning.

mod discovery;
mod processing;

pub use discovery::*;
pub use processing::*;
