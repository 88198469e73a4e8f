//! Fixed seed codebook: the 240 unit-pattern root vectors, used purely as
//! deterministic seed material for the per-order context hashes. The table is
//! pure data, generated once and never mutated.

use std::sync::OnceLock;

use crate::constants::{CODEBOOK_ROOTS, PHI_U64};

/// The precomputed root table. Coordinates are stored doubled (so every
/// entry is an exact small integer): type-I roots use +/-2 in two positions,
/// type-II roots use +/-1 in all eight.
pub struct SeedCodebook {
    roots: [[i8; 8]; CODEBOOK_ROOTS],
}

static CODEBOOK: OnceLock<SeedCodebook> = OnceLock::new();

impl SeedCodebook {
    /// Shared instance, generated on first use.
    pub fn get() -> &'static SeedCodebook {
        CODEBOOK.get_or_init(SeedCodebook::generate)
    }

    fn generate() -> Self {
        let mut roots = [[0i8; 8]; CODEBOOK_ROOTS];
        let mut idx = 0;

        // Type I: (+/-1, +/-1, 0, ..., 0) over all position pairs. 112 roots.
        for i in 0..8 {
            for j in (i + 1)..8 {
                for s1 in [2i8, -2] {
                    for s2 in [2i8, -2] {
                        roots[idx][i] = s1;
                        roots[idx][j] = s2;
                        idx += 1;
                    }
                }
            }
        }

        // Type II: (+/-1/2, ..., +/-1/2) with an even number of minus signs.
        // 128 roots.
        for bits in 0u16..256 {
            if bits.count_ones() % 2 != 0 {
                continue;
            }
            for (j, coord) in roots[idx].iter_mut().enumerate() {
                *coord = if (bits >> j) & 1 == 1 { -1 } else { 1 };
            }
            idx += 1;
        }

        debug_assert_eq!(idx, CODEBOOK_ROOTS);
        Self { roots }
    }

    /// Root coordinates as floats (halving the stored doubled values).
    pub fn root(&self, idx: usize) -> [f32; 8] {
        let mut out = [0.0f32; 8];
        for (o, &c) in out.iter_mut().zip(self.roots[idx % CODEBOOK_ROOTS].iter()) {
            *o = c as f32 * 0.5;
        }
        out
    }

    /// Squared norm of a root, in doubled-coordinate units (always 8).
    pub fn norm_sq_doubled(&self, idx: usize) -> i32 {
        self.roots[idx % CODEBOOK_ROOTS]
            .iter()
            .map(|&c| (c as i32) * (c as i32))
            .sum()
    }

    /// Derive a 64-bit hash seed from the root at `slot`. Folds the doubled
    /// coordinates through the golden-ratio multiplier so nearby slots give
    /// well-dispersed seeds.
    pub fn seed(&self, slot: usize) -> u64 {
        let root = &self.roots[slot * 89 % CODEBOOK_ROOTS];
        let mut h: u64 = 0x9e37_79b9_7f4a_7c15 ^ (slot as u64);
        for &c in root {
            h ^= (c as i64 as u64) & 0xff;
            h = h.wrapping_mul(PHI_U64);
            h ^= h >> 29;
        }
        h
    }

    pub fn len(&self) -> usize {
        CODEBOOK_ROOTS
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}
