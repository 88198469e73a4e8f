//! Bounded scratch arena, reset once per frame. Allocation inside the
//! symbol-processing loop is a programming error; all per-frame buffers are
//! reserved during frame setup and handed out as disjoint views.

use crate::error::{QzError, Result};

const WORD: usize = 4;

/// Handle to a reserved region. Plain offsets, so reservations stay valid
/// across mutable borrows of the arena itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    start: usize,
    words: usize,
}

impl Reservation {
    pub fn len_words(&self) -> usize {
        self.words
    }
}

/// Fixed-capacity bump arena backed by a single word buffer.
pub struct BoundedArena {
    words: Box<[u32]>,
    offset: usize,
    peak: usize,
}

impl BoundedArena {
    /// `capacity_bytes` is rounded up to a whole number of 4-byte words.
    pub fn with_capacity(capacity_bytes: usize) -> Self {
        let words = capacity_bytes.div_ceil(WORD);
        Self {
            words: vec![0u32; words].into_boxed_slice(),
            offset: 0,
            peak: 0,
        }
    }

    /// Reserve `count * elem_size` bytes, rounded up to word alignment.
    /// Fails deterministically when the request exceeds remaining capacity.
    pub fn allocate(&mut self, count: usize, elem_size: usize) -> Result<Reservation> {
        let bytes = count
            .checked_mul(elem_size)
            .ok_or_else(|| QzError::InvalidConfig("arena request overflows usize".into()))?;
        let need = bytes.div_ceil(WORD);
        if self.offset + need > self.words.len() {
            return Err(QzError::ArenaExhausted {
                requested: bytes,
                remaining: (self.words.len() - self.offset) * WORD,
            });
        }
        let r = Reservation {
            start: self.offset,
            words: need,
        };
        self.offset += need;
        self.peak = self.peak.max(self.offset);
        Ok(r)
    }

    /// O(1); keeps the buffer, restores the offset. Call between frames.
    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Mutable view of one reservation.
    pub fn slice_mut(&mut self, r: Reservation) -> &mut [u32] {
        &mut self.words[r.start..r.start + r.words]
    }

    /// Read-only view of one reservation.
    pub fn slice(&self, r: Reservation) -> &[u32] {
        &self.words[r.start..r.start + r.words]
    }

    /// Disjoint mutable views of two reservations. `a` must precede `b`;
    /// overlap would mean the allocator handed out the same region twice.
    pub fn pair_mut(&mut self, a: Reservation, b: Reservation) -> (&mut [u32], &mut [u32]) {
        assert!(a.start + a.words <= b.start, "reservations overlap");
        let (head, tail) = self.words.split_at_mut(b.start);
        (
            &mut head[a.start..a.start + a.words],
            &mut tail[..b.words],
        )
    }

    pub fn remaining_bytes(&self) -> usize {
        (self.words.len() - self.offset) * WORD
    }

    /// High-water mark across all frames since construction.
    pub fn peak_bytes(&self) -> usize {
        self.peak * WORD
    }

    pub fn capacity_bytes(&self) -> usize {
        self.words.len() * WORD
    }
}
