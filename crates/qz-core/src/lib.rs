//! Core types for the quasicrystal stream compressor: errors, configuration,
//! the fixed seed codebook, the bounded frame arena, and the golden-ratio
//! context hasher.

pub mod arena;
pub mod codebook;
pub mod config;
pub mod constants;
pub mod error;
pub mod hasher;

pub use arena::{BoundedArena, Reservation};
pub use codebook::SeedCodebook;
pub use config::CompressorConfig;
pub use error::{QzError, Result};
pub use hasher::FibonacciHasher;
