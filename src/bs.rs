use statrs::distribution::{ ContinuousCDF, Normal };

fn normal_cdf(x: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(x),
        Err(_) => f64::NAN,
    }
}

/// Black-Scholes price of a European call on a non-dividend stock, the
/// value the Monte Carlo estimate converges to.
pub fn call_price(
    spot: f32,
    strike: f32,
    volatility: f32,
    risk_free_rate: f32,
    years_to_expiry: f32
) -> f32 {
    let (spot, strike) = (spot as f64, strike as f64);
    let (volatility, risk_free_rate) = (volatility as f64, risk_free_rate as f64);
    let years_to_expiry = years_to_expiry as f64;

    let discount = (-risk_free_rate * years_to_expiry).exp();
    let sigma_sqrt_t = volatility * years_to_expiry.sqrt();
    if sigma_sqrt_t <= 0.0 {
        // deterministic forward
        return (spot - strike * discount).max(0.0) as f32;
    }

    let d1: f64 =
        ((spot / strike).ln() + (risk_free_rate + (volatility * volatility) / 2.0) * years_to_expiry) /
        sigma_sqrt_t;
    let d2: f64 = d1 - sigma_sqrt_t;

    let call: f64 = spot * normal_cdf(d1) - strike * discount * normal_cdf(d2);
    call as f32
}

#[test]
fn known_value() {
    // Hull's textbook example: S=42, K=40, r=10%, sigma=20%, T=0.5 -> 4.76
    let price = call_price(42.0, 40.0, 0.2, 0.1, 0.5);
    assert!((price - 4.76).abs() < 0.01, "{}", price);
}

#[test]
fn atm_one_year() {
    let price = call_price(100.0, 100.0, 0.2, 0.05, 1.0);
    approx::assert_abs_diff_eq!(price, 10.4506, epsilon = 1e-3);
}

#[test]
fn zero_volatility_is_intrinsic_forward() {
    let price = call_price(100.0, 90.0, 0.0, 0.05, 1.0);
    approx::assert_abs_diff_eq!(price, 100.0 - 90.0 * (-0.05f32).exp(), epsilon = 1e-4);
    assert_eq!(call_price(80.0, 100.0, 0.0, 0.0, 1.0), 0.0);
}
