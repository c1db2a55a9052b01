use crate::error::{ checked_path_count, Result };
use crate::market::MarketParams;
use crate::reduce::pairwise_sum;

struct Lanes<const LANES: usize>;

impl<const LANES: usize> Lanes<LANES> {
    /// Evaluated per instantiation, so `LANES = 0` fails to build.
    const NON_ZERO: () = assert!(LANES > 0, "lane count must be at least one");
}

/// Lane-parallel payoff accumulation with `LANES` scalar accumulators.
///
/// Path `i` always lands in lane `i % LANES`. Every round reads `LANES`
/// consecutive samples; in the last round lanes past `num_paths` are skipped
/// by the index guard and add nothing. Returns the undiscounted payoff sum.
///
/// A lane count of zero is rejected at compile time:
///
/// ```compile_fail
/// use monte_carlo_lanes::{ kernel, MarketParams };
///
/// let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);
/// let _ = kernel::sum_payoffs::<0>(&[0.5], 1, &market);
/// ```
pub fn sum_payoffs<const LANES: usize>(
    samples: &[f32],
    num_paths: i64,
    market: &MarketParams
) -> Result<f32> {
    let n = checked_path_count(samples, num_paths)?;
    let partial_sums = lane_sums::<LANES>(&samples[..n], market);
    Ok(pairwise_sum(&partial_sums))
}

/// Per-lane partial sums over every sample in `samples`.
pub fn lane_sums<const LANES: usize>(samples: &[f32], market: &MarketParams) -> [f32; LANES] {
    let () = Lanes::<LANES>::NON_ZERO;
    let terms = market.gbm_terms();
    let n = samples.len();
    let mut partial_sums = [0.0f32; LANES];

    for base in (0..n).step_by(LANES) {
        for (lane, sum) in partial_sums.iter_mut().enumerate() {
            let idx = base + lane;
            if idx < n {
                *sum += terms.call_payoff(market, samples[idx]);
            }
        }
    }

    partial_sums
}

#[cfg(test)]
fn scenario() -> (MarketParams, [f32; 4]) {
    (MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2), [0.0, 1.0, -1.0, 0.5])
}

#[test]
fn zero_paths_is_zero() {
    let market = MarketParams::new(f32::NAN, 1.0, -2.0, 0.05, 0.2);
    assert_eq!(sum_payoffs::<8>(&[], 0, &market), Ok(0.0));
    assert_eq!(sum_payoffs::<8>(&[1.0, 2.0], 0, &market), Ok(0.0));
}

#[test]
fn single_path_matches_closed_form() {
    let market = MarketParams::new(100.0, 95.0, 0.75, 0.03, 0.25);
    let z = 0.4f32;
    let expected = (100.0 * ((0.03 - 0.5 * 0.25 * 0.25) * 0.75 + 0.25 * 0.75f32.sqrt() * z).exp() -
        95.0f32).max(0.0);
    let sum = sum_payoffs::<8>(&[z], 1, &market).unwrap();
    approx::assert_relative_eq!(sum, expected, max_relative = 1e-5);
}

#[test]
fn concrete_scenario() {
    let (market, z) = scenario();
    let expected: f64 = [0.03f64, 0.23, -0.17, 0.13]
        .iter()
        .map(|x| (100.0 * x.exp() - 100.0).max(0.0))
        .sum();
    let sum = sum_payoffs::<8>(&z, 4, &market).unwrap();
    assert!((sum as f64 - expected).abs() < 1e-4, "{} vs {}", sum, expected);
}

#[test]
fn lane_counts_agree() {
    let (market, _) = scenario();
    let samples: Vec<f32> = (0..1000).map(|i| ((i as f32) * 0.37).sin() * 2.5).collect();
    let n = samples.len() as i64;

    let base = sum_payoffs::<1>(&samples, n, &market).unwrap();
    for sum in [
        sum_payoffs::<2>(&samples, n, &market).unwrap(),
        sum_payoffs::<4>(&samples, n, &market).unwrap(),
        sum_payoffs::<8>(&samples, n, &market).unwrap(),
        sum_payoffs::<16>(&samples, n, &market).unwrap(),
    ] {
        approx::assert_relative_eq!(sum, base, max_relative = 1e-4);
    }
}

#[test]
fn partial_last_round() {
    let (market, _) = scenario();
    let samples = [0.1, -0.3, 1.2, 0.8, -2.0, 0.5, 1.9, 0.0, 0.7, 1.1];
    let reference = crate::reference::sequential_sum(&samples, &market);
    let sum = sum_payoffs::<8>(&samples, 10, &market).unwrap();
    approx::assert_relative_eq!(sum as f64, reference, max_relative = 1e-5);

    // lanes 2..8 see no index in the second round
    let lanes = lane_sums::<8>(&samples, &market);
    let terms = market.gbm_terms();
    approx::assert_relative_eq!(
        lanes[0],
        terms.call_payoff(&market, 0.1) + terms.call_payoff(&market, 0.7)
    );
    assert_eq!(lanes[2], terms.call_payoff(&market, 1.2));
}

#[test]
fn only_first_n_samples_are_read() {
    let (market, _) = scenario();
    let samples = [1.0, 1.0, 1.0, f32::NAN, f32::NAN];
    let sum = sum_payoffs::<4>(&samples, 3, &market).unwrap();
    assert!(sum.is_finite());
}

#[test]
fn deep_out_of_the_money() {
    let market = MarketParams::new(100.0, 1.0e6, 1.0, 0.05, 0.2);
    let samples = [3.0, 2.5, -1.0, 0.0, 4.0];
    assert_eq!(sum_payoffs::<4>(&samples, 5, &market), Ok(0.0));
}

#[test]
fn nan_propagates() {
    let market = MarketParams::new(100.0, 100.0, -1.0, 0.05, 0.2);
    assert!(sum_payoffs::<8>(&[0.5, 1.0], 2, &market).unwrap().is_nan());

    let (market, _) = scenario();
    assert!(sum_payoffs::<8>(&[0.5, f32::NAN, -3.0], 3, &market).unwrap().is_nan());
}

#[test]
fn bad_arguments() {
    use crate::error::KernelError;

    let (market, z) = scenario();
    assert_eq!(
        sum_payoffs::<8>(&z, -4, &market),
        Err(KernelError::NegativePathCount { num_paths: -4 })
    );
    assert_eq!(
        sum_payoffs::<8>(&z, 5, &market),
        Err(KernelError::InsufficientSamples { required: 5, available: 4 })
    );
}
