use crate::market::MarketParams;

/// Plain sequential estimate in double precision, one path after another.
/// Used to check the lane kernels; it has no lanes and no guard.
pub fn sequential_sum(samples: &[f32], market: &MarketParams) -> f64 {
    let spot = market.spot as f64;
    let strike = market.strike as f64;
    let years_to_expiry = market.years_to_expiry as f64;
    let volatility = market.volatility as f64;

    let drift = (market.risk_free_rate as f64 - 0.5 * volatility * volatility) * years_to_expiry;
    let vol_dt = volatility * years_to_expiry.sqrt();

    let mut payoff_sum = 0.0;
    for &z in samples {
        let terminal_price = spot * (drift + vol_dt * (z as f64)).exp();
        let intrinsic = terminal_price - strike;
        payoff_sum += if intrinsic.is_nan() { intrinsic } else { intrinsic.max(0.0) };
    }
    payoff_sum
}

#[test]
fn concrete_scenario() {
    let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);
    let sum = sequential_sum(&[0.0, 1.0, -1.0, 0.5], &market);
    let expected = 100.0 * (0.03f64.exp() + 0.23f64.exp() + 0.13f64.exp()) - 300.0;
    approx::assert_relative_eq!(sum, expected, max_relative = 1e-6);
}

#[test]
fn empty_is_zero() {
    let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);
    assert_eq!(sequential_sum(&[], &market), 0.0);
}
