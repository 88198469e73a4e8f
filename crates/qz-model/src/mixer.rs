//! Context mixer: blends the per-order probability vectors into one mixed
//! distribution with fixed, geometrically decaying weights. Longer contexts
//! get more trust; an order with no data contributes a uniform vector at its
//! full weight, so encode and decode always blend the same shape.

use tracing::trace;

use qz_core::codebook::SeedCodebook;
use qz_core::constants::{ALPHABET, CONTEXT_ORDERS, PHI_INV, UNIFORM_QPROB, WEIGHT_SCALE};
use qz_core::hasher::FibonacciHasher;

use crate::table::ContextTable;

pub const ORDER_COUNT: usize = CONTEXT_ORDERS.len();

/// Recent-byte window. Max context order is 8, so the whole window lives in
/// one u64 with the most recent byte in the low position.
#[derive(Debug, Clone, Copy, Default)]
pub struct History {
    acc: u64,
    len: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.acc = (self.acc << 8) | byte as u64;
        if self.len < 8 {
            self.len += 1;
        }
    }

    #[inline]
    pub fn window(&self) -> u64 {
        self.acc
    }

    /// Bytes available, capped at the widest context order.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

pub struct ContextMixer {
    tables: [ContextTable; ORDER_COUNT],
    weights: [u32; ORDER_COUNT],
    seeds: [u64; ORDER_COUNT],
    refresh_interval: u32,
    since_refresh: u32,
}

impl ContextMixer {
    pub fn new(table_size: usize, refresh_interval: u32) -> Self {
        let codebook = SeedCodebook::get();
        let mut seeds = [0u64; ORDER_COUNT];
        for (i, seed) in seeds.iter_mut().enumerate() {
            *seed = codebook.seed(i);
        }
        Self {
            tables: std::array::from_fn(|_| ContextTable::new(table_size)),
            weights: Self::derive_weights(),
            seeds,
            refresh_interval,
            since_refresh: 0,
        }
    }

    /// weight[i] proportional to phi^-(maxIdx - i), quantized to u32 summing
    /// exactly to WEIGHT_SCALE. Strictly increasing with order.
    fn derive_weights() -> [u32; ORDER_COUNT] {
        let mut raw = [0f64; ORDER_COUNT];
        let mut sum = 0f64;
        for (i, w) in raw.iter_mut().enumerate() {
            *w = PHI_INV.powi((ORDER_COUNT - 1 - i) as i32);
            sum += *w;
        }
        let mut fixed = [0u32; ORDER_COUNT];
        let mut acc = 0u32;
        for i in 0..ORDER_COUNT - 1 {
            fixed[i] = ((raw[i] / sum) * WEIGHT_SCALE as f64).round() as u32;
            acc += fixed[i];
        }
        // Fold rounding drift into the heaviest weight so the sum is exact.
        fixed[ORDER_COUNT - 1] = WEIGHT_SCALE - acc;
        debug_assert!(fixed.windows(2).all(|w| w[0] < w[1]));
        fixed
    }

    /// Blend per-order predictions for the next symbol into `mixed`
    /// (length 256, caller-provided arena scratch). Orders whose window
    /// exceeds the available history contribute uniformly, as do orders with
    /// an empty or colliding slot.
    pub fn predict(&self, history: History, mixed: &mut [u32]) {
        debug_assert_eq!(mixed.len(), ALPHABET);
        mixed.fill(0);
        for (i, &order) in CONTEXT_ORDERS.iter().enumerate() {
            let weight = self.weights[i];
            let probs = if history.len() >= order {
                let key = FibonacciHasher::window_key(history.window(), order, self.seeds[i]);
                self.tables[i].lookup(key)
            } else {
                None
            };
            match probs {
                Some(q) => {
                    for (m, &p) in mixed.iter_mut().zip(q.iter()) {
                        *m += weight * p as u32;
                    }
                }
                None => {
                    // Uniform fallback at the same quantization scale, so a
                    // missing order never silently redistributes its weight.
                    for m in mixed.iter_mut() {
                        *m += weight * UNIFORM_QPROB as u32;
                    }
                }
            }
        }
    }

    /// Feed the observed symbol into every eligible order and advance the
    /// lazy refresh schedule. Encode and decode call this with identical
    /// arguments at every step, keeping table state in lockstep.
    pub fn update(&mut self, history: History, symbol: u8) {
        for (i, &order) in CONTEXT_ORDERS.iter().enumerate() {
            if history.len() >= order {
                let key = FibonacciHasher::window_key(history.window(), order, self.seeds[i]);
                self.tables[i].update(key, symbol);
            }
        }
        self.since_refresh += 1;
        if self.since_refresh >= self.refresh_interval {
            self.refresh();
        }
    }

    /// Recompute quantized probabilities for hot slots in every table.
    pub fn refresh(&mut self) {
        let hot: usize = self.tables.iter().map(|t| t.hot_count()).sum();
        for table in self.tables.iter_mut() {
            table.refresh();
        }
        self.since_refresh = 0;
        trace!(hot, "probability refresh");
    }

    pub fn weights(&self) -> &[u32; ORDER_COUNT] {
        &self.weights
    }

    #[cfg(test)]
    pub(crate) fn table(&self, order_idx: usize) -> &ContextTable {
        &self.tables[order_idx]
    }
}
