use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use monte_carlo_lanes::{ accumulate, bs, reference, sampler, Backend, KernelConfig, MarketParams };
use tracing::info;
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt };

/// Monte Carlo European call pricer: CPU reference against the lane kernel
#[derive(Parser)]
#[command(name = "mc-lanes")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of simulated paths
    #[arg(short = 'n', long, default_value_t = 1000)]
    paths: i64,

    /// Initial stock price
    #[arg(long, default_value_t = 100.0)]
    spot: f32,

    /// Strike price
    #[arg(short, long, default_value_t = 105.0)]
    strike: f32,

    /// Time to maturity in years
    #[arg(short, long, default_value_t = 1.0)]
    years: f32,

    /// Annual risk-free rate
    #[arg(short, long, default_value_t = 0.05)]
    rate: f32,

    /// Annual volatility
    #[arg(short, long, default_value_t = 0.2)]
    volatility: f32,

    /// Seed for the standard normal samples
    #[arg(long, default_value_t = sampler::DEFAULT_SEED)]
    seed: u64,

    /// Kernel backend (scalar, simd, rayon)
    #[arg(short, long, default_value_t = Backend::Simd)]
    backend: Backend,

    /// Lanes per round
    #[arg(short, long, default_value_t = monte_carlo_lanes::DEFAULT_LANES)]
    lanes: usize,

    /// Samples per rayon task
    #[arg(long, default_value_t = monte_carlo_lanes::parallel::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

/// Mean payoff discounted to today.
fn discounted_price(payoff_sum: f64, num_paths: i64, risk_free_rate: f32, years_to_expiry: f32) -> f64 {
    if num_paths <= 0 {
        return 0.0;
    }
    (-(risk_free_rate as f64) * (years_to_expiry as f64)).exp() * payoff_sum / (num_paths as f64)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let market = MarketParams::new(cli.spot, cli.strike, cli.years, cli.rate, cli.volatility);
    let config = KernelConfig::new(cli.backend, cli.lanes, cli.chunk_size);
    config.validate().context("invalid kernel configuration")?;

    let num_samples = usize::try_from(cli.paths)
        .with_context(|| format!("path count must be non-negative, got {}", cli.paths))?;
    let samples = sampler::standard_normals(num_samples, cli.seed);
    info!(paths = cli.paths, seed = cli.seed, backend = %cli.backend, "samples ready");

    let now = Instant::now();
    let cpu_sum = reference::sequential_sum(&samples, &market);
    let cpu_time = now.elapsed();

    let cpu_price = discounted_price(cpu_sum, cli.paths, cli.rate, cli.years);
    println!("CPU payoff sum: ${:.2}", cpu_sum);
    println!("CPU option price: ${:.2}", cpu_price);
    println!("CPU time: {:.2} ms", cpu_time.as_secs_f64() * 1000.0);
    println!();

    let now = Instant::now();
    let kernel_sum = accumulate(&samples, cli.paths, &market, &config).context("kernel run failed")?;
    let kernel_time = now.elapsed();

    let kernel_price = discounted_price(kernel_sum as f64, cli.paths, cli.rate, cli.years);
    println!("Kernel [{} x{}] payoff sum: ${:.2}", cli.backend, cli.lanes, kernel_sum);
    println!("Kernel option price: ${:.2}", kernel_price);
    println!("Kernel time: {:.2} ms", kernel_time.as_secs_f64() * 1000.0);
    println!();

    println!(
        "Black-Scholes price: ${:.2}",
        bs::call_price(cli.spot, cli.strike, cli.volatility, cli.rate, cli.years)
    );

    Ok(())
}

#[test]
fn discounting() {
    let price = discounted_price(1000.0, 100, 0.05, 1.0);
    approx::assert_relative_eq!(price, 10.0 * (-0.05f64).exp(), max_relative = 1e-6);
    assert_eq!(discounted_price(5.0, 0, 0.05, 1.0), 0.0);
}

#[test]
fn cli_defaults() {
    let cli = Cli::parse_from(["mc-lanes"]);
    assert_eq!(cli.paths, 1000);
    assert_eq!(cli.strike, 105.0);
    assert_eq!(cli.backend, Backend::Simd);
    assert_eq!(cli.lanes, 8);

    let cli = Cli::parse_from(["mc-lanes", "--backend", "scalar", "--lanes", "16", "-n", "10"]);
    assert_eq!(cli.backend, Backend::Scalar);
    assert_eq!(cli.lanes, 16);
    assert_eq!(cli.paths, 10);
}
