use wide::*;
use bytemuck::cast;
use crate::error::{ checked_path_count, Result };
use crate::market::{ clamp_payoff, GbmTerms, MarketParams };
use crate::reduce::pairwise_sum;

/// Lanes held in one `f32x8` register.
pub const SIMD_LANES: usize = 8;

/// `f32x8::exp` is only accurate for `|x|` below this; larger, infinite and
/// NaN arguments come back as zero.
const EXP_RANGE: f32 = 87.0;

/// Broadcast copies of the run constants, built once outside the round loop.
#[derive(Clone, Copy)]
pub(crate) struct Splats {
    drift: f32x8,
    vol_dt: f32x8,
    spot: f32x8,
    strike: f32x8,
    zeros: f32x8,
    nan: f32x8,
    exp_range: f32x8,
    lane_ids: f32x8,
    market: MarketParams,
}

impl Splats {
    pub(crate) fn new(terms: &GbmTerms, market: &MarketParams) -> Self {
        Splats {
            drift: f32x8::splat(terms.drift),
            vol_dt: f32x8::splat(terms.vol_dt),
            spot: f32x8::splat(market.spot),
            strike: f32x8::splat(market.strike),
            zeros: f32x8::splat(0.0),
            nan: f32x8::splat(f32::NAN),
            exp_range: f32x8::splat(EXP_RANGE),
            lane_ids: f32x8::from([0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]),
            market: *market,
        }
    }

    /// Payoffs of eight paths at once.
    #[inline(always)]
    fn payoffs(&self, z: f32x8) -> f32x8 {
        let x = f32x8::mul_add(self.vol_dt, z, self.drift);
        let intrinsic = f32x8::mul_sub(self.spot, x.exp(), self.strike);

        // max() hands back the zero for a NaN lane, so NaN lanes are
        // re-inserted explicitly.
        let invalid = intrinsic.cmp_ne(intrinsic);
        let payoffs = invalid.blend(self.nan, intrinsic.max(self.zeros));

        // false for NaN x as well as out of range
        let in_range = x.abs().cmp_lt(self.exp_range);
        if in_range.move_mask() == 0xff {
            return payoffs;
        }
        self.rescue_out_of_range(x, in_range, payoffs)
    }

    /// Recomputes lanes whose `x` is outside the vector exp range with the
    /// scalar exp, so overflow gives inf and NaN stays NaN like the scalar
    /// backend.
    #[cold]
    fn rescue_out_of_range(&self, x: f32x8, in_range: f32x8, payoffs: f32x8) -> f32x8 {
        let xs: [f32; SIMD_LANES] = cast(x);
        let mut lanes: [f32; SIMD_LANES] = cast(payoffs);
        let in_range = in_range.move_mask();

        for (lane, payoff) in lanes.iter_mut().enumerate() {
            if in_range & (1 << lane) == 0 {
                *payoff = clamp_payoff(self.market.spot * xs[lane].exp() - self.market.strike);
            }
        }
        f32x8::from(lanes)
    }
}

/// Copies up to eight samples into a register, zero filling the rest.
#[inline(always)]
fn load_round(round: &[f32]) -> f32x8 {
    let mut lanes = [0.0f32; SIMD_LANES];
    lanes[..round.len()].copy_from_slice(round);
    f32x8::from(lanes)
}

/// Eight-lane accumulation of `samples` into unreduced per-lane sums.
///
/// Full rounds run unmasked. The trailing round is zero padded on load and
/// its lanes at or beyond `samples.len()` are masked to zero before they
/// reach the accumulator.
pub(crate) fn lane_sums(samples: &[f32], splats: &Splats) -> f32x8 {
    let mut partial_sums = splats.zeros;

    let mut rounds = samples.chunks_exact(SIMD_LANES);
    for round in &mut rounds {
        partial_sums += splats.payoffs(load_round(round));
    }

    let tail = rounds.remainder();
    if !tail.is_empty() {
        let active = splats.lane_ids.cmp_lt(f32x8::splat(tail.len() as f32));
        let payoffs = splats.payoffs(load_round(tail));
        partial_sums += active.blend(payoffs, splats.zeros);
    }

    partial_sums
}

/// SIMD counterpart of [`crate::kernel::sum_payoffs`] with eight lanes.
pub fn sum_payoffs(samples: &[f32], num_paths: i64, market: &MarketParams) -> Result<f32> {
    let n = checked_path_count(samples, num_paths)?;
    let splats = Splats::new(&market.gbm_terms(), market);
    let partial_sums: [f32; SIMD_LANES] = cast(lane_sums(&samples[..n], &splats));
    Ok(pairwise_sum(&partial_sums))
}

#[test]
fn matches_scalar_lanes() {
    let market = MarketParams::new(100.0, 105.0, 1.0, 0.05, 0.2);
    let samples: Vec<f32> = (0..1003).map(|i| ((i as f32) * 0.61).cos() * 2.0).collect();

    let scalar = crate::kernel::sum_payoffs::<8>(&samples, 1003, &market).unwrap();
    let simd = sum_payoffs(&samples, 1003, &market).unwrap();
    approx::assert_relative_eq!(simd, scalar, max_relative = 1e-4);
}

#[test]
fn concrete_scenario() {
    let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);
    let expected: f64 = [0.03f64, 0.23, -0.17, 0.13]
        .iter()
        .map(|x| (100.0 * x.exp() - 100.0).max(0.0))
        .sum();
    let sum = sum_payoffs(&[0.0, 1.0, -1.0, 0.5], 4, &market).unwrap();
    approx::assert_relative_eq!(sum as f64, expected, max_relative = 1e-5);
}

#[test]
fn tail_lanes_add_nothing() {
    // strike zero makes every padded lane worth spot * exp(drift) if unmasked
    let market = MarketParams::new(100.0, 0.0, 1.0, 0.05, 0.2);
    let samples = [0.3, -0.2, 0.9, 1.4, -0.7, 0.0, 0.2, -1.1, 0.6, 0.4];
    let reference = crate::reference::sequential_sum(&samples, &market);

    let sum = sum_payoffs(&samples, 10, &market).unwrap();
    approx::assert_relative_eq!(sum as f64, reference, max_relative = 1e-5);

    let splats = Splats::new(&market.gbm_terms(), &market);
    let lanes: [f32; 8] = cast(lane_sums(&samples[8..], &splats));
    assert_eq!(&lanes[2..], &[0.0; 6]);
}

#[test]
fn zero_paths_and_deep_otm() {
    let market = MarketParams::new(100.0, 1.0e6, 1.0, 0.05, 0.2);
    assert_eq!(sum_payoffs(&[], 0, &market), Ok(0.0));
    assert_eq!(sum_payoffs(&[3.0; 13], 13, &market), Ok(0.0));
}

#[test]
fn nan_propagates() {
    let negative_expiry = MarketParams::new(100.0, 100.0, -1.0, 0.05, 0.2);
    assert!(sum_payoffs(&[0.5; 9], 9, &negative_expiry).unwrap().is_nan());

    let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);
    let mut samples = [0.5f32; 9];
    samples[8] = f32::NAN;
    assert!(sum_payoffs(&samples, 9, &market).unwrap().is_nan());
    assert!(sum_payoffs(&samples, 8, &market).unwrap().is_finite());
}

#[test]
fn overflow_and_infinity_reach_the_sum() {
    let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);

    // x = 0.03 + 0.2 * 445 overflows S0 * exp(x)
    let mut full_round = vec![0.1f32; 8];
    full_round[7] = 445.0;
    let mut tail_round = vec![0.1f32; 9];
    tail_round[8] = 445.0;

    for samples in [vec![0.5, f32::INFINITY, -0.3], vec![445.0], full_round, tail_round] {
        let n = samples.len() as i64;
        let scalar = crate::kernel::sum_payoffs::<8>(&samples, n, &market).unwrap();
        let simd = sum_payoffs(&samples, n, &market).unwrap();
        assert_eq!(scalar, f32::INFINITY);
        assert_eq!(simd.to_bits(), scalar.to_bits(), "{:?}", samples);
    }

    assert_eq!(sum_payoffs(&[f32::NEG_INFINITY; 3], 3, &market), Ok(0.0));
    assert_eq!(sum_payoffs(&[-445.0; 9], 9, &market), Ok(0.0));
}

#[test]
fn out_of_range_lanes_match_scalar_payoffs() {
    let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);
    let terms = market.gbm_terms();
    let splats = Splats::new(&terms, &market);
    let z = [0.5, f32::INFINITY, -0.3, f32::NEG_INFINITY, f32::NAN, 445.0, -445.0, 1.0];

    let payoffs: [f32; 8] = cast(splats.payoffs(f32x8::from(z)));
    for lane in [1, 3, 5, 6] {
        assert_eq!(payoffs[lane], terms.call_payoff(&market, z[lane]), "lane {}", lane);
    }
    assert!(payoffs[4].is_nan());
    approx::assert_relative_eq!(payoffs[0], terms.call_payoff(&market, 0.5), max_relative = 1e-5);
}
