//! Grain-aware chunker: splits input into bounded, contiguous frames whose
//! boundaries prefer natural token separators, so a split rarely cuts
//! through the middle of a word or number.

/// One frame: the byte range [start, end) of the original input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub start: usize,
    pub end: usize,
}

impl Frame {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

const SEPARATORS: [u8; 12] = [
    b' ', b'\n', b'\r', b'\t', b'.', b',', b';', b':', b'!', b'?', b'-', b'_',
];

pub struct GrainChunker {
    target_size: usize,
    window: usize,
}

impl GrainChunker {
    pub fn new(target_size: usize, window: usize) -> Self {
        Self {
            target_size,
            window,
        }
    }

    /// Split `data` into contiguous, non-overlapping frames covering every
    /// byte exactly once. Frame count stays within a small constant of
    /// ceil(len / target).
    pub fn frames(&self, data: &[u8]) -> Vec<Frame> {
        let total = data.len();
        let mut frames = Vec::with_capacity(total / self.target_size + 1);
        let mut start = 0;
        while start < total {
            let target_end = start + self.target_size;
            let end = if target_end >= total {
                total
            } else {
                self.find_boundary(data, start, target_end)
            };
            frames.push(Frame { start, end });
            start = end;
        }
        frames
    }

    /// Nearest separator-aligned cut around `target_end`: prefer a forward
    /// match within the window, fall back to a backward match, and cut at
    /// the exact target when neither side has one.
    fn find_boundary(&self, data: &[u8], start: usize, target_end: usize) -> usize {
        // Start one byte early: a separator at target_end - 1 yields an
        // exactly-target-size, separator-aligned cut.
        let forward_limit = (target_end + self.window).min(data.len());
        for (i, &b) in data
            .iter()
            .enumerate()
            .take(forward_limit)
            .skip(target_end - 1)
        {
            if is_separator(b) {
                return i + 1;
            }
        }

        let backward_limit = target_end.saturating_sub(self.window).max(start + 1);
        for i in (backward_limit..target_end).rev() {
            if is_separator(data[i - 1]) {
                return i;
            }
        }

        target_end
    }
}

fn is_separator(byte: u8) -> bool {
    SEPARATORS.contains(&byte)
}
