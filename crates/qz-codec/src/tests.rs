use crate::chunker::GrainChunker;
use crate::compressor::{compress, decompress, Compressor};
use crate::rangecoder::{quantize_distribution, RangeDecoder, RangeEncoder};
use qz_core::config::CompressorConfig;
use qz_core::constants::ALPHABET;
use qz_core::error::QzError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn small_config() -> CompressorConfig {
    CompressorConfig {
        target_frame_size: 256,
        boundary_window: 64,
        table_size: 1009,
        refresh_interval: 128,
        arena_bytes: 8192,
    }
}

fn sample_text(size: usize) -> Vec<u8> {
    b"the quick brown fox jumps over the lazy dog. "
        .iter()
        .cycle()
        .take(size)
        .copied()
        .collect()
}

// ========== Range coder ==========

#[test]
fn test_coder_round_trip_uniform() {
    let freq = vec![1u32; ALPHABET];
    let total = ALPHABET as u32;
    let symbols: Vec<u8> = (0..=255).collect();

    let mut enc = RangeEncoder::new();
    for &s in &symbols {
        enc.encode_symbol(&freq, total, s);
    }
    let payload = enc.finish();

    let mut dec = RangeDecoder::new(&payload);
    for &s in &symbols {
        assert_eq!(dec.decode_symbol(&freq, total).unwrap(), s);
    }
}

#[test]
fn test_coder_round_trip_skewed() {
    let mut freq = vec![1u32; ALPHABET];
    freq[b'a' as usize] = 12000;
    freq[b'b' as usize] = 3000;
    let total: u32 = freq.iter().sum();

    let symbols: Vec<u8> = b"aaabaaabaaabbbaa".to_vec();
    let mut enc = RangeEncoder::new();
    for &s in &symbols {
        enc.encode_symbol(&freq, total, s);
    }
    let payload = enc.finish();
    // Heavily skewed: 16 symbols should cost far fewer than 16 bytes.
    assert!(payload.len() < 12, "payload {} bytes", payload.len());

    let mut dec = RangeDecoder::new(&payload);
    for &s in &symbols {
        assert_eq!(dec.decode_symbol(&freq, total).unwrap(), s);
    }
}

#[test]
fn test_coder_round_trip_long_random() {
    let mut rng = StdRng::seed_from_u64(17);
    let mut freq = vec![0u32; ALPHABET];
    for f in freq.iter_mut() {
        *f = rng.gen_range(1..64);
    }
    let total: u32 = freq.iter().sum();
    let symbols: Vec<u8> = (0..5000).map(|_| rng.gen()).collect();

    let mut enc = RangeEncoder::new();
    for &s in &symbols {
        enc.encode_symbol(&freq, total, s);
    }
    let payload = enc.finish();

    let mut dec = RangeDecoder::new(&payload);
    for &s in &symbols {
        assert_eq!(dec.decode_symbol(&freq, total).unwrap(), s);
    }
}

#[test]
fn test_coder_truncated_payload_reports_error() {
    let freq = vec![1u32; ALPHABET];
    let total = ALPHABET as u32;
    let symbols: Vec<u8> = (0..200).map(|i| (i * 7) as u8).collect();

    let mut enc = RangeEncoder::new();
    for &s in &symbols {
        enc.encode_symbol(&freq, total, s);
    }
    let payload = enc.finish();

    // Starve the decoder of most of the payload.
    let mut dec = RangeDecoder::new(&payload[..4]);
    let mut failed = false;
    for _ in 0..symbols.len() {
        if dec.decode_symbol(&freq, total).is_err() {
            failed = true;
            break;
        }
    }
    assert!(failed, "exhausted payload must surface an error");
}

#[test]
fn test_coder_empty_input_does_not_panic() {
    let freq = vec![1u32; ALPHABET];
    let mut dec = RangeDecoder::new(&[]);
    // Free to fail or decode garbage, but must terminate without panicking.
    let _ = dec.decode_symbol(&freq, ALPHABET as u32);
}

#[test]
fn test_quantize_total_below_coder_bound() {
    let mixed = vec![1u32; ALPHABET];
    let mut freq = vec![0u32; ALPHABET];
    let total = quantize_distribution(&mixed, &mut freq);
    assert_eq!(total, freq.iter().sum::<u32>());
    assert!(total < 1 << 16);
    assert!(freq.iter().all(|&f| f >= 1), "no zero probability allowed");
}

#[test]
fn test_quantize_preserves_skew() {
    let mut mixed = vec![10u32; ALPHABET];
    mixed[0] = 1_000_000;
    let mut freq = vec![0u32; ALPHABET];
    let total = quantize_distribution(&mixed, &mut freq);
    assert!(freq[0] > total / 2, "dominant symbol keeps most of the mass");
    assert!(freq[1] >= 1);
}

#[test]
fn test_quantize_deterministic() {
    let mixed: Vec<u32> = (0..ALPHABET as u32).map(|i| i * 31 + 7).collect();
    let mut a = vec![0u32; ALPHABET];
    let mut b = vec![0u32; ALPHABET];
    let ta = quantize_distribution(&mixed, &mut a);
    let tb = quantize_distribution(&mixed, &mut b);
    assert_eq!(ta, tb);
    assert_eq!(a, b);
}

// ========== Chunker ==========

fn assert_exact_cover(frames: &[crate::chunker::Frame], len: usize) {
    if len == 0 {
        assert!(frames.is_empty());
        return;
    }
    assert_eq!(frames[0].start, 0);
    assert_eq!(frames.last().unwrap().end, len);
    for pair in frames.windows(2) {
        assert_eq!(pair[0].end, pair[1].start, "gap or overlap between frames");
    }
    assert!(frames.iter().all(|f| !f.is_empty()));
}

#[test]
fn test_chunker_empty_input() {
    let chunker = GrainChunker::new(64, 16);
    assert!(chunker.frames(b"").is_empty());
}

#[test]
fn test_chunker_input_smaller_than_target() {
    let chunker = GrainChunker::new(1024, 64);
    let frames = chunker.frames(b"short input");
    assert_eq!(frames.len(), 1);
    assert_exact_cover(&frames, 11);
}

#[test]
fn test_chunker_exact_cover_text() {
    let data = sample_text(10_000);
    let chunker = GrainChunker::new(512, 64);
    let frames = chunker.frames(&data);
    assert_exact_cover(&frames, data.len());
}

#[test]
fn test_chunker_prefers_separator_boundaries() {
    let data = sample_text(4096);
    let chunker = GrainChunker::new(300, 64);
    let frames = chunker.frames(&data);
    // Every non-final boundary should sit just after a separator, since the
    // text has one every few bytes.
    for f in &frames[..frames.len() - 1] {
        let before = data[f.end - 1];
        assert!(
            b" \n\r\t.,;:!?-_".contains(&before),
            "frame end {} not separator-aligned (byte {:?})",
            f.end,
            before as char
        );
    }
}

#[test]
fn test_chunker_separator_at_exact_target_is_used() {
    // Separator sits exactly one byte before the target cut; the frame
    // should end right on target with a separator-aligned boundary.
    let data = b"abcdefg abcdefg abcdefg ";
    let chunker = GrainChunker::new(8, 4);
    let frames = chunker.frames(data);
    assert_eq!(frames[0].end, 8);
    assert_eq!(data[frames[0].end - 1], b' ');
    assert_exact_cover(&frames, data.len());
}

#[test]
fn test_chunker_no_separators_cuts_at_target() {
    let data = vec![b'x'; 1000];
    let chunker = GrainChunker::new(256, 64);
    let frames = chunker.frames(&data);
    assert_exact_cover(&frames, 1000);
    assert_eq!(frames[0].end, 256);
    assert_eq!(frames[1].end, 512);
}

#[test]
fn test_chunker_frame_count_near_ideal() {
    let data = sample_text(100_000);
    let target = 1000;
    let chunker = GrainChunker::new(target, 100);
    let frames = chunker.frames(&data);
    let ideal = data.len().div_ceil(target);
    assert!(
        frames.len().abs_diff(ideal) <= ideal / 10 + 2,
        "got {} frames, ideal {}",
        frames.len(),
        ideal
    );
}

#[test]
fn test_chunker_random_inputs_cover_exactly() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..20 {
        let len = rng.gen_range(0..5000);
        let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let target = rng.gen_range(16..1024);
        let chunker = GrainChunker::new(target, 32);
        let frames = chunker.frames(&data);
        assert_exact_cover(&frames, data.len());
    }
}

// ========== Compressor round trips ==========

#[test]
fn test_round_trip_empty() {
    let compressed = compress(b"").unwrap();
    assert_eq!(decompress(&compressed).unwrap(), b"");
}

#[test]
fn test_round_trip_single_byte() {
    let compressed = compress(b"x").unwrap();
    assert_eq!(decompress(&compressed).unwrap(), b"x");
}

#[test]
fn test_round_trip_aabab() {
    let compressed = compress(b"aabab").unwrap();
    assert_eq!(decompress(&compressed).unwrap(), b"aabab");
}

#[test]
fn test_round_trip_hello() {
    let data = b"Hello, world! Hello again.";
    let compressed = compress(data).unwrap();
    assert_eq!(decompress(&compressed).unwrap(), data);
}

#[test]
fn test_round_trip_all_byte_values() {
    let data: Vec<u8> = (0..=255u8).cycle().take(1024).collect();
    let compressed = compress(&data).unwrap();
    assert_eq!(decompress(&compressed).unwrap(), data);
}

#[test]
fn test_round_trip_random_binary() {
    let mut rng = StdRng::seed_from_u64(42);
    let data: Vec<u8> = (0..10_000).map(|_| rng.gen()).collect();
    let compressed = compress(&data).unwrap();
    assert_eq!(decompress(&compressed).unwrap(), data);
}

#[test]
fn test_round_trip_multi_frame() {
    let data = sample_text(4096);
    let comp = Compressor::new(small_config()).unwrap();
    let (compressed, stats) = comp.compress_with_stats(&data).unwrap();
    assert!(stats.frame_count > 4, "expected several frames");
    assert_eq!(comp.decompress(&compressed).unwrap(), data);
}

#[test]
fn test_round_trip_text_with_structure() {
    let data = b"{\"role\":\"user\",\"content\":\"hi\"}\n".repeat(100);
    let compressed = compress(&data).unwrap();
    assert_eq!(decompress(&compressed).unwrap(), data);
    assert!(compressed.len() < data.len());
}

#[test]
fn test_round_trip_frame_boundary_edges() {
    // Inputs sized right at and around the frame target.
    let comp = Compressor::new(small_config()).unwrap();
    for len in [255, 256, 257, 511, 512, 513] {
        let data = sample_text(len);
        let compressed = comp.compress(&data).unwrap();
        assert_eq!(comp.decompress(&compressed).unwrap(), data, "len {len}");
    }
}

// ========== Determinism ==========

#[test]
fn test_compress_deterministic() {
    let data = sample_text(3000);
    let a = compress(&data).unwrap();
    let b = compress(&data).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_compress_deterministic_across_instances() {
    let data = sample_text(1000);
    let a = Compressor::new(small_config()).unwrap().compress(&data).unwrap();
    let b = Compressor::new(small_config()).unwrap().compress(&data).unwrap();
    assert_eq!(a, b);
}

// ========== Compression effectiveness ==========

#[test]
fn test_adaptive_skew_compresses_two_symbol_stream() {
    // The "aabab" scenario scaled up: once counts adapt, a two-symbol
    // alphabet costs well under 8 bits per byte.
    let data = b"aabab".repeat(200);
    let compressed = compress(&data).unwrap();
    assert!(
        compressed.len() < data.len() * 7 / 10,
        "compressed {} of {}",
        compressed.len(),
        data.len()
    );
}

#[test]
fn test_all_zeros_approaches_entropy_floor() {
    let data = vec![0u8; 100_000];
    let compressed = compress(&data).unwrap();
    assert!(
        compressed.len() < data.len() / 16,
        "compressed {} of {}",
        compressed.len(),
        data.len()
    );
    assert_eq!(decompress(&compressed).unwrap(), data);
}

#[test]
fn test_repetitive_text_compresses() {
    let data = sample_text(20_000);
    let compressed = compress(&data).unwrap();
    assert!(compressed.len() < data.len() / 2);
}

#[test]
fn test_stats_report_sizes() {
    let data = sample_text(2000);
    let (compressed, stats) = Compressor::default().compress_with_stats(&data).unwrap();
    assert_eq!(stats.original_len, data.len());
    assert_eq!(stats.compressed_len, compressed.len());
    assert!(stats.ratio() > 0.0 && stats.ratio() < 1.0);
    assert!(stats.bits_per_byte() < 8.0);
}

// ========== Bounded memory ==========

#[test]
fn test_arena_peak_constant_in_input_size() {
    let comp = Compressor::new(small_config()).unwrap();
    let (_, small) = comp.compress_with_stats(&sample_text(1024)).unwrap();
    let (_, large) = comp.compress_with_stats(&sample_text(102_400)).unwrap();
    assert_eq!(
        small.arena_peak_bytes, large.arena_peak_bytes,
        "per-frame scratch must not grow with input size"
    );
}

#[test]
fn test_arena_too_small_is_reported() {
    let cfg = CompressorConfig {
        arena_bytes: 512,
        ..small_config()
    };
    let comp = Compressor::new(cfg).unwrap();
    let err = comp.compress(b"some input data").unwrap_err();
    assert!(matches!(err, QzError::ArenaExhausted { .. }), "{err}");
}

// ========== Collision safety ==========

#[test]
fn test_round_trip_under_tiny_table() {
    // Thirteen slots force constant collisions; overwrite-on-collision must
    // stay bit-identical between encode and decode.
    let cfg = CompressorConfig {
        table_size: 13,
        ..small_config()
    };
    let comp = Compressor::new(cfg).unwrap();
    let data = sample_text(5000);
    let compressed = comp.compress(&data).unwrap();
    assert_eq!(comp.decompress(&compressed).unwrap(), data);
}

#[test]
fn test_round_trip_single_slot_table() {
    let cfg = CompressorConfig {
        table_size: 1,
        ..small_config()
    };
    let comp = Compressor::new(cfg).unwrap();
    let data: Vec<u8> = (0..2000u32).map(|i| (i % 7) as u8 + b'a').collect();
    let compressed = comp.compress(&data).unwrap();
    assert_eq!(comp.decompress(&compressed).unwrap(), data);
}

// ========== Corruption handling ==========

#[test]
fn test_decompress_rejects_bad_magic() {
    let err = decompress(b"NOPE\x01\x00\x05\x00garbagegarbage").unwrap_err();
    assert!(matches!(err, QzError::BadMagic), "{err}");
}

#[test]
fn test_decompress_rejects_truncated_header() {
    let err = decompress(b"QZF1\x01").unwrap_err();
    assert!(matches!(err, QzError::TruncatedStream(_)), "{err}");
}

#[test]
fn test_decompress_rejects_wrong_version() {
    let mut compressed = compress(b"hello").unwrap();
    compressed[4] = 9;
    let err = decompress(&compressed).unwrap_err();
    assert!(matches!(err, QzError::UnsupportedVersion(9)), "{err}");
}

#[test]
fn test_decompress_rejects_trailing_garbage() {
    let mut compressed = compress(b"hello world").unwrap();
    compressed.extend_from_slice(b"extra");
    let err = decompress(&compressed).unwrap_err();
    assert!(matches!(err, QzError::Corrupt(_)), "{err}");
}

#[test]
fn test_decompress_truncated_payload_fails_cleanly() {
    let data = sample_text(2000);
    let compressed = compress(&data).unwrap();
    // Chop the stream mid-payload: must error (or at worst return wrong
    // bytes), never panic or hang.
    let result = decompress(&compressed[..compressed.len() - 40]);
    match result {
        Err(_) => {}
        Ok(out) => assert_ne!(out, data),
    }
}

#[test]
fn test_decompress_flipped_payload_byte_no_panic() {
    let data = sample_text(1500);
    let mut compressed = compress(&data).unwrap();
    let idx = compressed.len() - 10;
    compressed[idx] ^= 0x40;
    match decompress(&compressed) {
        Err(_) => {}
        Ok(out) => assert_ne!(out, data),
    }
}

#[test]
fn test_decompress_rejects_corrupt_length_field() {
    let data = sample_text(600);
    let mut compressed = compress(&data).unwrap();
    // The original-length field sits at bytes 8..16; a corrupted value must
    // surface as a decode failure, not a giant allocation.
    for b in &mut compressed[8..16] {
        *b = 0xFF;
    }
    let err = decompress(&compressed).unwrap_err();
    assert!(matches!(err, QzError::LengthMismatch { .. }), "{err}");
}

#[test]
fn test_decompress_random_garbage_no_panic() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let len = rng.gen_range(0..200);
        let garbage: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let _ = decompress(&garbage);
    }
}

// ========== Config plumbing ==========

#[test]
fn test_compressor_rejects_invalid_config() {
    let cfg = CompressorConfig {
        target_frame_size: 0,
        ..Default::default()
    };
    assert!(Compressor::new(cfg).is_err());
}

#[test]
fn test_decode_requires_matching_config() {
    // Different table sizes give a different adaptive model; decode is free
    // to produce garbage but the stream structure must still be handled
    // without panicking.
    let data = sample_text(800);
    let a = Compressor::new(small_config()).unwrap();
    let b = Compressor::new(CompressorConfig {
        table_size: 1,
        ..small_config()
    })
    .unwrap();
    let compressed = a.compress(&data).unwrap();
    match b.decompress(&compressed) {
        Err(_) => {}
        Ok(out) => assert_ne!(out, data),
    }
}
