use approx::assert_relative_eq;
use monte_carlo_lanes::{ accumulate, bs, kernel, reference, sampler, simd };
use monte_carlo_lanes::{ Backend, KernelConfig, MarketParams };
use proptest::prelude::*;

fn market_strategy() -> impl Strategy<Value = MarketParams> {
    (50.0f32..150.0, 0.0f32..200.0, 0.0f32..3.0, -0.02f32..0.1, 0.0f32..0.6).prop_map(
        |(spot, strike, years, rate, volatility)| {
            MarketParams::new(spot, strike, years, rate, volatility)
        }
    )
}

fn lane_sums_agree(samples: &[f32], market: &MarketParams) -> Result<(), TestCaseError> {
    let n = samples.len() as i64;
    let base = reference::sequential_sum(samples, market);
    let sums = [
        kernel::sum_payoffs::<1>(samples, n, market).unwrap(),
        kernel::sum_payoffs::<2>(samples, n, market).unwrap(),
        kernel::sum_payoffs::<4>(samples, n, market).unwrap(),
        kernel::sum_payoffs::<8>(samples, n, market).unwrap(),
        kernel::sum_payoffs::<16>(samples, n, market).unwrap(),
        simd::sum_payoffs(samples, n, market).unwrap(),
    ];
    // rounding scales with the terminal prices, not with the payoffs
    let terms = market.gbm_terms();
    let price_mass: f64 = samples
        .iter()
        .map(|&z| terms.terminal_price(market.spot, z) as f64)
        .sum();
    let tolerance = 5e-5 * price_mass + 1e-3;

    for sum in sums {
        prop_assert!(((sum as f64) - base).abs() <= tolerance, "{} vs {}", sum, base);
    }
    Ok(())
}

proptest! {
    #[test]
    fn lane_count_does_not_change_estimator(
        market in market_strategy(),
        samples in prop::collection::vec(-4.0f32..4.0, 0..300)
    ) {
        lane_sums_agree(&samples, &market)?;
    }

    #[test]
    fn raising_one_sample_never_lowers_the_sum(
        market in market_strategy(),
        samples in prop::collection::vec(-4.0f32..4.0, 1..100),
        pick in any::<prop::sample::Index>(),
        bump in 0.01f32..1.0
    ) {
        let n = samples.len() as i64;
        let idx = pick.index(samples.len());
        let terms = market.gbm_terms();

        let mut raised = samples.clone();
        raised[idx] += bump;
        prop_assert!(terms.call_payoff(&market, raised[idx]) >= terms.call_payoff(&market, samples[idx]));

        let before = kernel::sum_payoffs::<8>(&samples, n, &market).unwrap();
        let after = kernel::sum_payoffs::<8>(&raised, n, &market).unwrap();
        prop_assert!(after >= before, "{} < {}", after, before);
    }

    #[test]
    fn zero_paths_for_any_market(
        market in market_strategy(),
        samples in prop::collection::vec(-4.0f32..4.0, 0..20)
    ) {
        for backend in [Backend::Scalar, Backend::Simd, Backend::Rayon] {
            let config = KernelConfig::new(backend, 8, 64);
            prop_assert_eq!(accumulate(&samples, 0, &market, &config), Ok(0.0));
        }
    }
}

#[test]
fn non_multiple_of_lanes() {
    let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);
    let samples = sampler::standard_normals(10, 3);
    let reference = reference::sequential_sum(&samples, &market);

    for backend in [Backend::Scalar, Backend::Simd, Backend::Rayon] {
        let sum = accumulate(&samples, 10, &market, &KernelConfig::new(backend, 8, 4)).unwrap();
        assert_relative_eq!(sum as f64, reference, max_relative = 1e-5);
    }
}

#[test]
fn concrete_four_path_scenario() {
    let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);
    let z = [0.0, 1.0, -1.0, 0.5];
    let expected: f64 = [0.03f64, 0.23, -0.17, 0.13]
        .iter()
        .map(|x| (100.0 * x.exp() - 100.0).max(0.0))
        .sum();

    for lanes in [1, 2, 4, 8, 16] {
        let config = KernelConfig::new(Backend::Scalar, lanes, 0);
        let sum = accumulate(&z, 4, &market, &config).unwrap();
        assert!(((sum as f64) - expected).abs() < 1e-4, "lanes {}: {} vs {}", lanes, sum, expected);
    }
}

#[test]
fn deep_out_of_the_money_is_zero() {
    let market = MarketParams::new(100.0, 1.0e7, 1.0, 0.05, 0.2);
    let samples = sampler::standard_normals(5000, 11);
    for backend in [Backend::Scalar, Backend::Simd, Backend::Rayon] {
        let sum = accumulate(&samples, 5000, &market, &KernelConfig::new(backend, 8, 256)).unwrap();
        assert_eq!(sum, 0.0);
    }
}

#[test]
fn converges_to_black_scholes() {
    let market = MarketParams::new(100.0, 105.0, 1.0, 0.05, 0.2);
    let num_paths = 200_000;
    let samples = sampler::standard_normals(num_paths, sampler::DEFAULT_SEED);

    let sum = accumulate(&samples, num_paths as i64, &market, &KernelConfig::default()).unwrap();
    let price = (-0.05f64).exp() * (sum as f64) / (num_paths as f64);
    let analytic = bs::call_price(100.0, 105.0, 0.2, 0.05, 1.0) as f64;

    // payoff std dev is about 14 here, so the standard error is about 0.03
    assert!((price - analytic).abs() < 0.15, "mc {} vs bs {}", price, analytic);
}

#[test]
fn infinite_and_overflowing_paths_reach_every_backend() {
    let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);
    let backends = [Backend::Scalar, Backend::Simd, Backend::Rayon];

    // z = 445 puts x at 89.03, past the point where S0 * exp(x) overflows f32
    let mut overflow_in_full_round = vec![0.2f32; 20];
    overflow_in_full_round[3] = 445.0;
    let cases = [vec![0.5, f32::INFINITY, -0.3], vec![445.0], overflow_in_full_round];

    for samples in &cases {
        let n = samples.len() as i64;
        for backend in backends {
            let sum = accumulate(samples, n, &market, &KernelConfig::new(backend, 8, 8)).unwrap();
            assert_eq!(sum.to_bits(), f32::INFINITY.to_bits(), "{} on {:?}", backend, samples);
        }
    }

    let finite = [0.5, -0.3, 1.1];
    let with_neg_inf = [0.5, f32::NEG_INFINITY, -0.3, 1.1];
    for backend in backends {
        let config = KernelConfig::new(backend, 8, 8);
        assert_eq!(accumulate(&[f32::NEG_INFINITY], 1, &market, &config), Ok(0.0));
        assert_eq!(accumulate(&[-445.0; 10], 10, &market, &config), Ok(0.0));

        let sum = accumulate(&with_neg_inf, 4, &market, &config).unwrap();
        let expected = accumulate(&finite, 3, &market, &config).unwrap();
        assert_relative_eq!(sum, expected, max_relative = 1e-6);
    }
}
