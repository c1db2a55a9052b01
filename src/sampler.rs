use rand::rngs::StdRng;
use rand::Rng;
use rand_core::SeedableRng;
use rand_distr::StandardNormal;

/// Seed used by the driver when none is given.
pub const DEFAULT_SEED: u64 = 42;

/// `n` standard normal draws from a seeded generator. The same seed always
/// yields the same buffer, which keeps runs of the driver and the benches
/// comparable.
pub fn standard_normals(n: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.sample::<f32, _>(StandardNormal)).collect()
}

#[cfg(test)]
fn test_normal_distribution(samples: usize, diff_limit: f32) {
    let dist = standard_normals(samples, DEFAULT_SEED);

    let mean: f32 = dist.iter().sum::<f32>() / (samples as f32);
    let variance: f32 =
        dist
            .iter()
            .map(|z| (z - mean).powi(2))
            .sum::<f32>() / (samples as f32);

    let mean_difference = mean.abs();
    let variance_difference = (variance - 1.0).abs();

    assert!(mean_difference <= diff_limit, "Mean difference was more than {diff_limit:.5}: {mean_difference:.5}");
    assert!(variance_difference <= diff_limit, "Variance difference was more than {diff_limit:.5}: {variance_difference:.5}");
}

#[test]
fn test_normal_distribution_1000() {
    test_normal_distribution(1000, 0.15);
}

#[test]
fn test_normal_distribution_100000() {
    test_normal_distribution(100000, 0.02);
}

#[test]
fn same_seed_same_samples() {
    assert_eq!(standard_normals(64, 9), standard_normals(64, 9));
    assert_ne!(standard_normals(64, 9), standard_normals(64, 10));
    assert!(standard_normals(0, 9).is_empty());
}
