//! Fixed numeric constants shared by the model and the coder.
//!
//! Buffer and table sizes follow Fibonacci numbers; the hash multiplier and
//! the count decay factor derive from the golden ratio.

/// Golden ratio.
pub const PHI: f64 = 1.618_033_988_749_894_8;
/// 1/phi, also the geometric ratio between adjacent mix weights.
pub const PHI_INV: f64 = 0.618_033_988_749_894_8;

/// Knuth's multiplicative hash constant, floor(2^64 / phi). Odd.
pub const PHI_U64: u64 = 11_400_714_819_323_198_485;

/// Alphabet size: plain bytes.
pub const ALPHABET: usize = 256;

/// Context orders, ascending. Max order 8 keeps the recent-byte window
/// inside a single u64 shift register.
pub const CONTEXT_ORDERS: [usize; 5] = [1, 2, 3, 5, 8];

/// Number of roots in the seed codebook (the E8 root system count).
pub const CODEBOOK_ROOTS: usize = 240;

/// Default slot count per context table. F21 = 10946: not a power of two,
/// so rolling-hash patterns in real text do not alias onto table structure.
pub const DEFAULT_TABLE_SIZE: usize = 10946;

/// Quantized probability ceiling, 12 bits. A scale much wider than the
/// alphabet is required for a single dominant symbol to approach
/// probability one after mixing.
pub const QPROB_SCALE: u16 = 4095;

/// Per-symbol value of the uniform quantized vector, (QPROB_SCALE + 1) / 256.
/// Used both for unrefreshed slots and the missing-order fallback so every
/// contribution arrives at the same scale.
pub const UNIFORM_QPROB: u16 = 16;

/// Per-slot total count that triggers a decay pass.
pub const DECAY_THRESHOLD: u32 = 1024;

/// Fixed-point decay multiplier: round(phi^-1 * 2^16). Applied as
/// `count * DECAY_MUL >> 16`, scaling counts by ~0.618.
pub const DECAY_MUL: u32 = 40503;

/// Symbols processed between lazy probability refreshes.
pub const DEFAULT_REFRESH_INTERVAL: u32 = 4096;

/// Fixed-point scale the mix weights sum to.
pub const WEIGHT_SCALE: u32 = 4096;

/// Scale used when quantizing a mixed distribution into coder frequencies.
/// With the mandatory +1 floor per symbol, the total stays below 1 << 15,
/// which the 32-bit range coder requires (total < BOTTOM = 1 << 16).
pub const FREQ_SCALE: u32 = (1 << 14) - ALPHABET as u32;

/// Default target frame size, F24 bytes.
pub const DEFAULT_FRAME_SIZE: usize = 46368;

/// Default look-around window when hunting for a frame boundary.
pub const DEFAULT_BOUNDARY_WINDOW: usize = 4096;

/// Default arena capacity. Per-frame scratch is ~2 KiB; the rest is slack
/// for callers that stage their own frame buffers.
pub const DEFAULT_ARENA_BYTES: usize = 16384;
