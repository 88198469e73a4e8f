use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ARENA_BYTES, DEFAULT_BOUNDARY_WINDOW, DEFAULT_FRAME_SIZE, DEFAULT_REFRESH_INTERVAL,
    DEFAULT_TABLE_SIZE,
};
use crate::error::{QzError, Result};

/// Tunable parameters for one compressor run. The same values must be used
/// on the encode and decode side; everything that affects the adaptive model
/// is either fixed here or recorded in the stream header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressorConfig {
    /// Target frame size in bytes. Actual frames drift by at most
    /// `boundary_window` to land on a separator byte.
    pub target_frame_size: usize,
    /// Look-around distance for the grain-aware boundary search.
    pub boundary_window: usize,
    /// Slot count per context table. Prefer a non-power-of-two value.
    pub table_size: usize,
    /// Symbols between lazy probability refreshes.
    pub refresh_interval: u32,
    /// Capacity of the per-frame scratch arena, in bytes.
    pub arena_bytes: usize,
}

impl CompressorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target_frame_size == 0 {
            return Err(QzError::InvalidConfig("target_frame_size must be > 0".into()));
        }
        if self.table_size == 0 {
            return Err(QzError::InvalidConfig("table_size must be > 0".into()));
        }
        if self.refresh_interval == 0 {
            return Err(QzError::InvalidConfig("refresh_interval must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            target_frame_size: DEFAULT_FRAME_SIZE,
            boundary_window: DEFAULT_BOUNDARY_WINDOW,
            table_size: DEFAULT_TABLE_SIZE,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            arena_bytes: DEFAULT_ARENA_BYTES,
        }
    }
}
