//! Compressor driver: chunker -> context model -> mixer -> range coder,
//! one symbol at a time, with the decode path running the identical
//! prediction/update sequence in the opposite I/O direction.
//!
//! Model state persists across frame boundaries (one sequential adaptive
//! stream over the whole input); the coder itself is reset and flushed per
//! frame so each frame carries a self-delimited payload.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use qz_core::arena::BoundedArena;
use qz_core::config::CompressorConfig;
use qz_core::constants::ALPHABET;
use qz_core::error::{QzError, Result};
use qz_model::mixer::{ContextMixer, History, ORDER_COUNT};

use crate::chunker::GrainChunker;
use crate::rangecoder::{quantize_distribution, RangeDecoder, RangeEncoder};

const MAGIC: [u8; 4] = *b"QZF1";
const VERSION: u16 = 1;
const HEADER_LEN: usize = 4 + 2 + 1 + 1 + 8 + 4 + 4;
const FRAME_HEADER_LEN: usize = 4 + 4;

/// Per-run accounting, returned by the `_with_stats` variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionStats {
    pub original_len: usize,
    pub compressed_len: usize,
    pub frame_count: usize,
    /// Arena high-water mark; constant in the input size for a fixed config.
    pub arena_peak_bytes: usize,
}

impl CompressionStats {
    pub fn ratio(&self) -> f64 {
        if self.original_len == 0 {
            return 1.0;
        }
        self.compressed_len as f64 / self.original_len as f64
    }

    pub fn bits_per_byte(&self) -> f64 {
        if self.original_len == 0 {
            return 0.0;
        }
        self.compressed_len as f64 * 8.0 / self.original_len as f64
    }
}

/// The stream compressor. `compress` and `decompress` are pure: each call
/// builds a fresh model and arena, and no state survives the call.
pub struct Compressor {
    config: CompressorConfig,
}

impl Compressor {
    pub fn new(config: CompressorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.compress_with_stats(data).map(|(out, _)| out)
    }

    pub fn compress_with_stats(&self, data: &[u8]) -> Result<(Vec<u8>, CompressionStats)> {
        let chunker = GrainChunker::new(self.config.target_frame_size, self.config.boundary_window);
        let frames = chunker.frames(data);
        let mut mixer = ContextMixer::new(self.config.table_size, self.config.refresh_interval);
        let mut arena = BoundedArena::with_capacity(self.config.arena_bytes);
        let mut history = History::new();

        let mut out =
            Vec::with_capacity(HEADER_LEN + frames.len() * FRAME_HEADER_LEN + data.len() / 2);
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.push(ORDER_COUNT as u8);
        out.push(0);
        out.extend_from_slice(&(data.len() as u64).to_le_bytes());
        out.extend_from_slice(&(frames.len() as u32).to_le_bytes());
        out.extend_from_slice(&(self.config.target_frame_size as u32).to_le_bytes());

        for frame in &frames {
            if frame.len() as u64 > u32::MAX as u64 {
                return Err(QzError::FrameTooLarge {
                    len: frame.len(),
                    limit: u32::MAX as usize,
                });
            }

            // All per-frame scratch is reserved here; the symbol loop below
            // performs no allocation.
            arena.reset();
            let mixed_r = arena.allocate(ALPHABET, 4)?;
            let freq_r = arena.allocate(ALPHABET, 4)?;

            let mut encoder = RangeEncoder::new();
            for &byte in &data[frame.start..frame.end] {
                let (mixed, freq) = arena.pair_mut(mixed_r, freq_r);
                mixer.predict(history, mixed);
                let total = quantize_distribution(mixed, freq);
                encoder.encode_symbol(freq, total, byte);
                mixer.update(history, byte);
                history.push(byte);
            }

            let payload = encoder.finish();
            trace!(
                start = frame.start,
                raw_len = frame.len(),
                payload_len = payload.len(),
                "frame encoded"
            );
            out.extend_from_slice(&(frame.len() as u32).to_le_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(&payload);
        }

        let stats = CompressionStats {
            original_len: data.len(),
            compressed_len: out.len(),
            frame_count: frames.len(),
            arena_peak_bytes: arena.peak_bytes(),
        };
        debug!(
            original = stats.original_len,
            compressed = stats.compressed_len,
            frames = stats.frame_count,
            "compress done"
        );
        Ok((out, stats))
    }

    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.decompress_with_stats(data).map(|(out, _)| out)
    }

    pub fn decompress_with_stats(&self, data: &[u8]) -> Result<(Vec<u8>, CompressionStats)> {
        let mut reader = StreamReader::new(data);

        let magic = reader.take(4, "magic")?;
        if magic != MAGIC {
            return Err(QzError::BadMagic);
        }
        let version = reader.read_u16("version")?;
        if version != VERSION {
            return Err(QzError::UnsupportedVersion(version));
        }
        let orders = reader.read_u8("order count")?;
        if orders as usize != ORDER_COUNT {
            return Err(QzError::Corrupt(format!(
                "stream built with {orders} context orders, this build uses {ORDER_COUNT}"
            )));
        }
        let _pad = reader.read_u8("padding")?;
        let original_len = reader.read_u64("original length")?;
        let frame_count = reader.read_u32("frame count")?;
        let _target = reader.read_u32("target frame size")?;

        let mut mixer = ContextMixer::new(self.config.table_size, self.config.refresh_interval);
        let mut arena = BoundedArena::with_capacity(self.config.arena_bytes);
        let mut history = History::new();
        // The header's length field is untrusted until the frames check out;
        // cap the pre-reservation so a corrupted field cannot force a giant
        // allocation. The vector grows naturally if the cap is too low.
        let reserve = original_len.min(data.len() as u64 * 64) as usize;
        let mut out = Vec::with_capacity(reserve);

        for _ in 0..frame_count {
            let raw_len = reader.read_u32("frame length")?;
            let payload_len = reader.read_u32("payload length")?;
            let payload = reader.take(payload_len as usize, "frame payload")?;

            arena.reset();
            let mixed_r = arena.allocate(ALPHABET, 4)?;
            let freq_r = arena.allocate(ALPHABET, 4)?;

            let mut decoder = RangeDecoder::new(payload);
            for _ in 0..raw_len {
                let (mixed, freq) = arena.pair_mut(mixed_r, freq_r);
                mixer.predict(history, mixed);
                let total = quantize_distribution(mixed, freq);
                let symbol = decoder.decode_symbol(freq, total)?;
                mixer.update(history, symbol);
                history.push(symbol);
                out.push(symbol);
            }
        }

        if !reader.is_empty() {
            return Err(QzError::Corrupt(format!(
                "{} trailing bytes after final frame",
                reader.remaining()
            )));
        }
        if out.len() as u64 != original_len {
            return Err(QzError::LengthMismatch {
                expected: original_len,
                got: out.len() as u64,
            });
        }

        let stats = CompressionStats {
            original_len: out.len(),
            compressed_len: data.len(),
            frame_count: frame_count as usize,
            arena_peak_bytes: arena.peak_bytes(),
        };
        debug!(
            original = stats.original_len,
            frames = stats.frame_count,
            "decompress done"
        );
        Ok((out, stats))
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self {
            config: CompressorConfig::default(),
        }
    }
}

/// Compress with the default configuration.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    Compressor::default().compress(data)
}

/// Decompress with the default configuration.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    Compressor::default().decompress(data)
}

/// Little-endian cursor over the compressed stream. Every read is
/// bounds-checked; running out of bytes is a reported truncation, never a
/// panic.
struct StreamReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> StreamReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(QzError::TruncatedStream(format!(
                "{what}: need {n} bytes, {} remain",
                self.buf.len() - self.pos
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn read_u16(&mut self, what: &str) -> Result<u16> {
        let b = self.take(2, what)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self, what: &str) -> Result<u32> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self, what: &str) -> Result<u64> {
        let b = self.take(8, what)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(b);
        Ok(u64::from_le_bytes(arr))
    }

    fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}
