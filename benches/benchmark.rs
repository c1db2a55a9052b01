use monte_carlo_lanes::{ accumulate, reference, sampler, Backend, KernelConfig, MarketParams };
use criterion::{ black_box, criterion_group, criterion_main, Criterion };

const SPOT: f32 = 100.0;
const STRIKE: f32 = 105.0;
const YEARS_TO_EXPIRY: f32 = 1.0;
const RISK_FREE_RATE: f32 = 0.05;
const VOLATILITY: f32 = 0.2;

fn bench_paths(c: &mut Criterion, num_paths: usize) {
    let market = MarketParams::new(SPOT, STRIKE, YEARS_TO_EXPIRY, RISK_FREE_RATE, VOLATILITY);
    let samples = sampler::standard_normals(num_paths, sampler::DEFAULT_SEED);
    let n = num_paths as i64;

    c.bench_function(&format!("cpu reference {}", num_paths), |b| b.iter(|| {
        reference::sequential_sum(black_box(&samples), &market)
    }));

    for lanes in [1, 8, 16] {
        let config = KernelConfig::new(Backend::Scalar, lanes, 0);
        c.bench_function(&format!("scalar x{} {}", lanes, num_paths), |b| b.iter(|| {
            accumulate(black_box(&samples), n, &market, &config)
        }));
    }

    let config = KernelConfig::new(Backend::Simd, 8, 0);
    c.bench_function(&format!("simd f32x8 {}", num_paths), |b| b.iter(|| {
        accumulate(black_box(&samples), n, &market, &config)
    }));

    let config = KernelConfig::default();
    let config = KernelConfig { backend: Backend::Rayon, ..config };
    c.bench_function(&format!("rayon f32x8 {}", num_paths), |b| b.iter(|| {
        accumulate(black_box(&samples), n, &market, &config)
    }));
}

fn criterion_benchmark_1000(c: &mut Criterion) {
    bench_paths(c, 1000);
}

fn criterion_benchmark_1000000(c: &mut Criterion) {
    bench_paths(c, 1_000_000);
}

criterion_group!(benches, criterion_benchmark_1000, criterion_benchmark_1000000);
criterion_main!(benches);
