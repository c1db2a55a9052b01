/// Market inputs for one pricing run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketParams {
    pub spot: f32,
    pub strike: f32,
    pub years_to_expiry: f32,
    pub risk_free_rate: f32,
    pub volatility: f32,
}

/// Terms of the GBM terminal price `S0 * exp(drift + vol_dt * z)` that do not
/// depend on the sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GbmTerms {
    pub drift: f32,
    pub vol_dt: f32,
}

impl MarketParams {
    pub fn new(
        spot: f32,
        strike: f32,
        years_to_expiry: f32,
        risk_free_rate: f32,
        volatility: f32
    ) -> Self {
        MarketParams { spot, strike, years_to_expiry, risk_free_rate, volatility }
    }

    /// Computed once per run so the square root is not paid per path.
    /// A negative `years_to_expiry` gives a NaN `vol_dt`, which is left for
    /// the kernel to propagate.
    pub fn gbm_terms(&self) -> GbmTerms {
        let drift =
            (self.risk_free_rate - 0.5 * (self.volatility * self.volatility)) *
            self.years_to_expiry;
        let vol_dt = self.volatility * self.years_to_expiry.sqrt();
        GbmTerms { drift, vol_dt }
    }
}

impl GbmTerms {
    #[inline(always)]
    pub fn terminal_price(&self, spot: f32, z: f32) -> f32 {
        spot * (self.drift + self.vol_dt * z).exp()
    }

    /// Payoff of one simulated path.
    #[inline(always)]
    pub fn call_payoff(&self, market: &MarketParams, z: f32) -> f32 {
        clamp_payoff(self.terminal_price(market.spot, z) - market.strike)
    }
}

/// `max(intrinsic, 0)` that keeps NaN. `f32::max` would return the zero.
#[inline(always)]
pub fn clamp_payoff(intrinsic: f32) -> f32 {
    if intrinsic.is_nan() { intrinsic } else { intrinsic.max(0.0) }
}

#[test]
fn gbm_terms_match_closed_form() {
    let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);
    let terms = market.gbm_terms();
    approx::assert_relative_eq!(terms.drift, 0.03, max_relative = 1e-6);
    approx::assert_relative_eq!(terms.vol_dt, 0.2, max_relative = 1e-6);
}

#[test]
fn zero_expiry_has_no_drift_or_diffusion() {
    let terms = MarketParams::new(100.0, 90.0, 0.0, 0.05, 0.3).gbm_terms();
    assert_eq!(terms.drift, 0.0);
    assert_eq!(terms.vol_dt, 0.0);
}

#[test]
fn negative_expiry_gives_nan_step() {
    let terms = MarketParams::new(100.0, 90.0, -1.0, 0.05, 0.3).gbm_terms();
    assert!(terms.vol_dt.is_nan());
}

#[test]
fn payoff_clamps_but_keeps_nan() {
    assert_eq!(clamp_payoff(-3.0), 0.0);
    assert_eq!(clamp_payoff(2.5), 2.5);
    assert!(clamp_payoff(f32::NAN).is_nan());
}

#[test]
fn call_payoff_in_and_out_of_the_money() {
    let market = MarketParams::new(100.0, 100.0, 1.0, 0.05, 0.2);
    let terms = market.gbm_terms();
    let expected = 100.0 * (0.23f32).exp() - 100.0;
    approx::assert_relative_eq!(terms.call_payoff(&market, 1.0), expected, max_relative = 1e-5);
    assert_eq!(terms.call_payoff(&market, -1.0), 0.0);
}
