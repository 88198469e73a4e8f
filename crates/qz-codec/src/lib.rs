//! Entropy coding and framing for the quasicrystal stream compressor: the
//! carry-less range coder, the grain-aware chunker, and the compressor
//! driver tying coder, chunker, arena, and context model together.

pub mod chunker;
pub mod compressor;
pub mod rangecoder;

pub use chunker::{Frame, GrainChunker};
pub use compressor::{compress, decompress, CompressionStats, Compressor};
pub use rangecoder::{quantize_distribution, RangeDecoder, RangeEncoder};

#[cfg(test)]
mod tests;
