use rayon::prelude::*;
use wide::f32x8;
use bytemuck::cast;
use crate::error::{ checked_path_count, KernelError, Result };
use crate::market::MarketParams;
use crate::reduce::{ add_lanes, pairwise_sum };
use crate::simd::{ lane_sums, Splats, SIMD_LANES };

/// Default number of samples handed to one rayon task.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Rounds `chunk_size` up to whole SIMD rounds so only the last chunk can
/// end in a partial round.
fn aligned_chunk_size(chunk_size: usize) -> Result<usize> {
    if chunk_size == 0 {
        return Err(KernelError::InvalidChunkSize);
    }
    Ok(chunk_size.div_ceil(SIMD_LANES) * SIMD_LANES)
}

/// Multithreaded eight-lane accumulation.
///
/// Each chunk is an independent SIMD lane loop on a rayon worker. Chunk lane
/// sums are collected in chunk order and folded sequentially, so the result
/// depends on `chunk_size` but never on how rayon scheduled the chunks.
pub fn sum_payoffs(
    samples: &[f32],
    num_paths: i64,
    market: &MarketParams,
    chunk_size: usize
) -> Result<f32> {
    let n = checked_path_count(samples, num_paths)?;
    let chunk_size = aligned_chunk_size(chunk_size)?;
    let splats = Splats::new(&market.gbm_terms(), market);

    let chunk_sums: Vec<[f32; SIMD_LANES]> = samples[..n]
        .par_chunks(chunk_size)
        .map(|chunk| cast::<f32x8, [f32; SIMD_LANES]>(lane_sums(chunk, &splats)))
        .collect();

    tracing::trace!(chunks = chunk_sums.len(), chunk_size, "combining chunk lane sums");

    let mut partial_sums = [0.0f32; SIMD_LANES];
    for sums in &chunk_sums {
        add_lanes(&mut partial_sums, sums);
    }

    Ok(pairwise_sum(&partial_sums))
}

#[test]
fn chunk_size_rounding() {
    assert_eq!(aligned_chunk_size(1), Ok(8));
    assert_eq!(aligned_chunk_size(8), Ok(8));
    assert_eq!(aligned_chunk_size(4097), Ok(4104));
    assert_eq!(aligned_chunk_size(0), Err(KernelError::InvalidChunkSize));
}

#[test]
fn single_chunk_equals_simd() {
    let market = MarketParams::new(100.0, 105.0, 1.0, 0.05, 0.2);
    let samples: Vec<f32> = (0..777).map(|i| ((i as f32) * 1.3).sin() * 2.2).collect();

    let simd = crate::simd::sum_payoffs(&samples, 777, &market).unwrap();
    let par = sum_payoffs(&samples, 777, &market, 1024).unwrap();
    assert_eq!(par.to_bits(), simd.to_bits());
}

#[test]
fn many_chunks_agree_with_reference() {
    let market = MarketParams::new(100.0, 95.0, 0.5, 0.03, 0.3);
    let samples = crate::sampler::standard_normals(20_001, 7);
    let reference = crate::reference::sequential_sum(&samples, &market);

    let par = sum_payoffs(&samples, 20_001, &market, 1000).unwrap();
    approx::assert_relative_eq!(par as f64, reference, max_relative = 1e-4);
}

#[test]
fn repeatable_bit_for_bit() {
    let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);
    let samples = crate::sampler::standard_normals(50_000, 42);

    let first = sum_payoffs(&samples, 50_000, &market, 512).unwrap();
    for _ in 0..5 {
        let again = sum_payoffs(&samples, 50_000, &market, 512).unwrap();
        assert_eq!(again.to_bits(), first.to_bits());
    }
}

#[test]
fn edge_cases() {
    let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);
    assert_eq!(sum_payoffs(&[], 0, &market, 64), Ok(0.0));
    assert_eq!(
        sum_payoffs(&[1.0], 1, &market, 0),
        Err(KernelError::InvalidChunkSize)
    );
    assert_eq!(
        sum_payoffs(&[1.0], -1, &market, 64),
        Err(KernelError::NegativePathCount { num_paths: -1 })
    );

    let negative_expiry = MarketParams::new(100.0, 100.0, -1.0, 0.05, 0.2);
    assert!(sum_payoffs(&[0.5; 100], 100, &negative_expiry, 16).unwrap().is_nan());
}
