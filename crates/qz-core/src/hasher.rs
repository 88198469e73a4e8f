//! Golden-ratio context hashing. Pure functions, no state.
//!
//! A context window is folded with FNV-1a (seeded per order from the
//! codebook), then spread over the table with Knuth's multiplicative
//! constant. One odd multiplier gives cheap avalanche; the non-power-of-two
//! table size does the rest.

use crate::constants::PHI_U64;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

pub struct FibonacciHasher;

impl FibonacciHasher {
    /// Hash the last `len` bytes held in the low end of `history`
    /// (most recent byte in the lowest position). Returns the full 64-bit
    /// key used for slot verification.
    #[inline]
    pub fn window_key(history: u64, len: usize, seed: u64) -> u64 {
        debug_assert!(len >= 1 && len <= 8);
        let mut h = FNV_OFFSET ^ seed;
        // Oldest byte first, so "ab" and "ba" diverge.
        for i in (0..len).rev() {
            h ^= (history >> (8 * i)) & 0xff;
            h = h.wrapping_mul(FNV_PRIME);
        }
        h
    }

    /// Reduce a full key to a slot index via the multiplicative hash.
    #[inline]
    pub fn slot(key: u64, table_size: usize) -> usize {
        let spread = key.wrapping_mul(PHI_U64);
        ((spread >> 32) as usize) % table_size
    }
}
