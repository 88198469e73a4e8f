//! Single-order context table: a fixed array of overwrite-on-collision
//! slots, each holding raw byte counts and a lazily refreshed quantized
//! probability vector.
//!
//! Slot lifecycle: Empty -> Populated(hot) on first update, hot -> cold when
//! a refresh pass recomputes the probabilities, cold -> hot on the next count
//! update. A colliding context simply overwrites the slot.

use qz_core::constants::{ALPHABET, DECAY_MUL, DECAY_THRESHOLD, QPROB_SCALE, UNIFORM_QPROB};
use qz_core::hasher::FibonacciHasher;

struct Slot {
    /// Full 64-bit window key; verifies the slot belongs to the caller's
    /// context and not a colliding one.
    key: u64,
    occupied: bool,
    hot: bool,
    total: u32,
    counts: [u16; ALPHABET],
    /// Quantized probabilities, 1..=QPROB_SCALE. Flat at UNIFORM_QPROB until
    /// the first refresh, which reads as a uniform prior.
    qprobs: [u16; ALPHABET],
}

impl Slot {
    fn fresh(key: u64) -> Self {
        Self {
            key,
            occupied: true,
            hot: false,
            total: 0,
            counts: [0; ALPHABET],
            qprobs: [UNIFORM_QPROB; ALPHABET],
        }
    }

    fn bump(&mut self, symbol: u8) {
        self.counts[symbol as usize] += 1;
        self.total += 1;
        if self.total > DECAY_THRESHOLD {
            self.decay();
        }
    }

    /// Scale every count by ~phi^-1. Bounds the counters and lets the slot
    /// forget stale history while keeping relative frequencies.
    fn decay(&mut self) {
        let mut total = 0u32;
        for c in self.counts.iter_mut() {
            *c = ((*c as u32 * DECAY_MUL) >> 16) as u16;
            total += *c as u32;
        }
        self.total = total;
    }

    /// Laplace-smoothed quantization of counts into 1..=QPROB_SCALE. The
    /// half-count floor guarantees no symbol ever reaches probability zero.
    fn refresh(&mut self) {
        let den = 2 * (self.total as u64 + 1);
        for (q, &c) in self.qprobs.iter_mut().zip(self.counts.iter()) {
            let num = (2 * c as u64 + 1) * QPROB_SCALE as u64;
            let rounded = (num + den / 2) / den;
            *q = rounded.clamp(1, QPROB_SCALE as u64) as u16;
        }
    }
}

pub struct ContextTable {
    slots: Vec<Slot>,
    hot_indices: Vec<u32>,
}

impl ContextTable {
    pub fn new(table_size: usize) -> Self {
        let mut slots = Vec::with_capacity(table_size);
        for _ in 0..table_size {
            slots.push(Slot {
                key: 0,
                occupied: false,
                hot: false,
                total: 0,
                counts: [0; ALPHABET],
                qprobs: [UNIFORM_QPROB; ALPHABET],
            });
        }
        Self {
            slots,
            hot_indices: Vec::with_capacity(table_size / 8 + 1),
        }
    }

    /// O(1). Returns `None` for an empty slot or a key mismatch (collision):
    /// a foreign context's statistics are never served.
    pub fn lookup(&self, key: u64) -> Option<&[u16; ALPHABET]> {
        let idx = FibonacciHasher::slot(key, self.slots.len());
        let slot = &self.slots[idx];
        if slot.occupied && slot.key == key {
            Some(&slot.qprobs)
        } else {
            None
        }
    }

    /// Record one observed symbol. A colliding key overwrites the slot with
    /// a fresh entry before counting.
    pub fn update(&mut self, key: u64, symbol: u8) {
        let idx = FibonacciHasher::slot(key, self.slots.len());
        let slot = &mut self.slots[idx];
        if !slot.occupied || slot.key != key {
            // Keep the hot flag: the index may already sit in the refresh
            // queue, and re-pushing it would duplicate the entry.
            let was_hot = slot.hot;
            *slot = Slot::fresh(key);
            slot.hot = was_hot;
        }
        slot.bump(symbol);
        if !slot.hot {
            slot.hot = true;
            self.hot_indices.push(idx as u32);
        }
    }

    /// Recompute quantized probabilities for slots touched since the last
    /// refresh. Cost is bounded by the number of distinct contexts touched,
    /// not the table size.
    pub fn refresh(&mut self) {
        for &idx in &self.hot_indices {
            let slot = &mut self.slots[idx as usize];
            slot.refresh();
            slot.hot = false;
        }
        self.hot_indices.clear();
    }

    /// Number of slots awaiting a refresh.
    pub fn hot_count(&self) -> usize {
        self.hot_indices.len()
    }

    pub fn table_size(&self) -> usize {
        self.slots.len()
    }
}
