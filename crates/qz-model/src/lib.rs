//! Multi-order adaptive context model: per-order hash tables of byte
//! statistics, blended by a fixed golden-ratio weighted mixer.

pub mod mixer;
pub mod table;

pub use mixer::{ContextMixer, History};
pub use table::ContextTable;
