//! Carry-less 32-bit range coder, Subbotin style.
//!
//! The interval is kept as (low, range). When the top byte of `low` and
//! `low + range` agree it is settled and emitted; when the range shrinks
//! below BOTTOM while the top byte still straddles a carry boundary, the
//! range is clamped to the boundary instead of propagating a carry, the
//! carry-less equivalent of classic E1/E2 underflow bit tracking. Encode and
//! decode run the identical narrowing, so a shared distribution at every
//! step keeps them in lockstep.

use qz_core::constants::{ALPHABET, FREQ_SCALE};
use qz_core::error::{QzError, Result};

/// Emit a byte once the top 8 bits are settled.
const TOP: u32 = 1 << 24;
/// Force renormalization below this range; all distribution totals must stay
/// under it so `range / total` never truncates to zero.
const BOTTOM: u32 = 1 << 16;

/// Trailing bytes emitted by `finish` to pin down the final interval.
const FLUSH_BYTES: usize = 4;

/// Quantize a mixed distribution into coder frequencies.
///
/// `freq[s] = 1 + mixed[s] * FREQ_SCALE / sum`, so every symbol keeps at
/// least one count (the coder cannot represent zero-probability events) and
/// the total stays below BOTTOM. Returns the exact total. Pure integer math:
/// encode and decode reproduce it bit for bit.
pub fn quantize_distribution(mixed: &[u32], freq: &mut [u32]) -> u32 {
    debug_assert_eq!(mixed.len(), ALPHABET);
    debug_assert_eq!(freq.len(), ALPHABET);
    let sum: u64 = mixed.iter().map(|&m| m as u64).sum();
    let mut total = 0u32;
    for (f, &m) in freq.iter_mut().zip(mixed.iter()) {
        let q = 1 + ((m as u64 * FREQ_SCALE as u64) / sum) as u32;
        *f = q;
        total += q;
    }
    debug_assert!(total < BOTTOM);
    total
}

pub struct RangeEncoder {
    low: u32,
    range: u32,
    output: Vec<u8>,
}

impl Default for RangeEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeEncoder {
    pub fn new() -> Self {
        Self {
            low: 0,
            range: u32::MAX,
            output: Vec::new(),
        }
    }

    /// Narrow the interval onto `symbol`'s cumulative slice of `freq`.
    /// After renormalization `range >= BOTTOM > total`, so the per-symbol
    /// slice is always at least one unit wide and no probability mass is
    /// rounded away.
    pub fn encode_symbol(&mut self, freq: &[u32], total: u32, symbol: u8) {
        let mut cum_low = 0u32;
        for &f in freq.iter().take(symbol as usize) {
            cum_low += f;
        }
        let cum_high = cum_low + freq[symbol as usize];

        let r = self.range / total;
        self.low = self.low.wrapping_add(cum_low.wrapping_mul(r));
        if cum_high < total {
            self.range = (cum_high - cum_low) * r;
        } else {
            // Last symbol absorbs the division remainder.
            self.range -= cum_low * r;
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        while self.low ^ self.low.wrapping_add(self.range) < TOP || self.range < BOTTOM {
            if self.low ^ self.low.wrapping_add(self.range) >= TOP {
                // Straddling a carry boundary with a small range: clamp.
                self.range = self.low.wrapping_neg() & (BOTTOM - 1);
            }
            self.output.push((self.low >> 24) as u8);
            self.low <<= 8;
            self.range <<= 8;
        }
    }

    /// Flush the tail bytes that disambiguate the final interval and return
    /// the payload. Required once per frame.
    pub fn finish(mut self) -> Vec<u8> {
        for _ in 0..FLUSH_BYTES {
            self.output.push((self.low >> 24) as u8);
            self.low <<= 8;
        }
        self.output
    }

    pub fn bytes_written(&self) -> usize {
        self.output.len()
    }
}

pub struct RangeDecoder<'a> {
    low: u32,
    range: u32,
    code: u32,
    input: &'a [u8],
    pos: usize,
    /// Reads past the end of `input`. The encoder's flush keeps a healthy
    /// stream at exactly zero; a truncated stream runs the counter up.
    overrun: usize,
}

impl<'a> RangeDecoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        let mut dec = Self {
            low: 0,
            range: u32::MAX,
            code: 0,
            input,
            pos: 0,
            overrun: 0,
        };
        for _ in 0..FLUSH_BYTES {
            dec.code = (dec.code << 8) | dec.next_byte() as u32;
        }
        dec
    }

    fn next_byte(&mut self) -> u8 {
        if self.pos < self.input.len() {
            let byte = self.input[self.pos];
            self.pos += 1;
            byte
        } else {
            self.overrun += 1;
            0
        }
    }

    /// Locate the symbol whose cumulative slice contains the coder value,
    /// then narrow exactly as the encoder did.
    ///
    /// A malformed stream decodes to arbitrary symbols, but never reads
    /// outside `input` (exhaustion is a reported error) and never loops.
    pub fn decode_symbol(&mut self, freq: &[u32], total: u32) -> Result<u8> {
        let r = self.range / total;
        let value = (self.code.wrapping_sub(self.low) / r).min(total - 1);

        let mut cum_low = 0u32;
        let mut symbol = None;
        for (s, &f) in freq.iter().enumerate() {
            if value < cum_low + f {
                symbol = Some((s as u8, cum_low, cum_low + f));
                break;
            }
            cum_low += f;
        }
        // Unreachable when the distribution sums to `total`; checked anyway
        // per the corruption taxonomy.
        let (symbol, cum_low, cum_high) = symbol
            .ok_or_else(|| QzError::Corrupt("decoded value outside all symbol ranges".into()))?;

        self.low = self.low.wrapping_add(cum_low.wrapping_mul(r));
        if cum_high < total {
            self.range = (cum_high - cum_low) * r;
        } else {
            self.range -= cum_low * r;
        }
        self.normalize();

        if self.overrun > FLUSH_BYTES {
            return Err(QzError::TruncatedStream(
                "bit payload exhausted before expected symbol count".into(),
            ));
        }
        Ok(symbol)
    }

    fn normalize(&mut self) {
        while self.low ^ self.low.wrapping_add(self.range) < TOP || self.range < BOTTOM {
            if self.low ^ self.low.wrapping_add(self.range) >= TOP {
                self.range = self.low.wrapping_neg() & (BOTTOM - 1);
            }
            self.code = (self.code << 8) | self.next_byte() as u32;
            self.low <<= 8;
            self.range <<= 8;
        }
    }
}
