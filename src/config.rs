use std::fmt;
use std::str::FromStr;
use crate::error::{ KernelError, Result };
use crate::market::MarketParams;
use crate::{ kernel, parallel, simd };

/// Lane count used when none is configured.
pub const DEFAULT_LANES: usize = 8;

/// Lane counts the scalar backend is instantiated for.
pub const SCALAR_LANES: [usize; 5] = [1, 2, 4, 8, 16];

/// Execution strategy for the lane loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// `[f32; LANES]` accumulators on the calling thread.
    Scalar,
    /// One `f32x8` register of accumulators.
    #[default]
    Simd,
    /// SIMD lane loops over fixed-size chunks on the rayon pool.
    Rayon,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Simd => "simd",
            Backend::Rayon => "rayon",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "scalar" => Ok(Backend::Scalar),
            "simd" => Ok(Backend::Simd),
            "rayon" | "parallel" => Ok(Backend::Rayon),
            _ => Err(KernelError::UnknownBackend(s.to_string())),
        }
    }
}

/// How a run is executed. Changing `lanes` or `chunk_size` changes the
/// floating-point summation order, so results may differ in the last bits
/// between configurations but are bit-identical for a fixed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    pub backend: Backend,
    pub lanes: usize,
    /// Samples per rayon task; only read by [`Backend::Rayon`].
    pub chunk_size: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        KernelConfig {
            backend: Backend::default(),
            lanes: DEFAULT_LANES,
            chunk_size: parallel::DEFAULT_CHUNK_SIZE,
        }
    }
}

impl KernelConfig {
    pub fn new(backend: Backend, lanes: usize, chunk_size: usize) -> Self {
        KernelConfig { backend, lanes, chunk_size }
    }

    fn unsupported(&self) -> KernelError {
        KernelError::UnsupportedLanes { lanes: self.lanes, backend: self.backend.name() }
    }

    /// Rejects lane counts the chosen backend has no instantiation for.
    pub fn validate(&self) -> Result<()> {
        let supported = match self.backend {
            Backend::Scalar => SCALAR_LANES.contains(&self.lanes),
            Backend::Simd | Backend::Rayon => self.lanes == simd::SIMD_LANES,
        };
        if !supported {
            return Err(self.unsupported());
        }
        if self.backend == Backend::Rayon && self.chunk_size == 0 {
            return Err(KernelError::InvalidChunkSize);
        }
        Ok(())
    }
}

/// Undiscounted sum of call payoffs over the first `num_paths` samples,
/// executed with the backend and lane count in `config`.
pub fn accumulate(
    samples: &[f32],
    num_paths: i64,
    market: &MarketParams,
    config: &KernelConfig
) -> Result<f32> {
    config.validate()?;
    tracing::debug!(
        num_paths,
        lanes = config.lanes,
        backend = %config.backend,
        "accumulating call payoffs"
    );

    match (config.backend, config.lanes) {
        (Backend::Scalar, 1) => kernel::sum_payoffs::<1>(samples, num_paths, market),
        (Backend::Scalar, 2) => kernel::sum_payoffs::<2>(samples, num_paths, market),
        (Backend::Scalar, 4) => kernel::sum_payoffs::<4>(samples, num_paths, market),
        (Backend::Scalar, 8) => kernel::sum_payoffs::<8>(samples, num_paths, market),
        (Backend::Scalar, 16) => kernel::sum_payoffs::<16>(samples, num_paths, market),
        (Backend::Simd, _) => simd::sum_payoffs(samples, num_paths, market),
        (Backend::Rayon, _) => parallel::sum_payoffs(samples, num_paths, market, config.chunk_size),
        _ => Err(config.unsupported()),
    }
}

#[test]
fn backend_names_round_trip() {
    for backend in [Backend::Scalar, Backend::Simd, Backend::Rayon] {
        assert_eq!(backend.to_string().parse::<Backend>(), Ok(backend));
    }
    assert_eq!("Parallel".parse::<Backend>(), Ok(Backend::Rayon));
    assert_eq!("gpu".parse::<Backend>(), Err(KernelError::UnknownBackend("gpu".to_string())));
}

#[test]
fn validation() {
    assert!(KernelConfig::default().validate().is_ok());
    assert!(KernelConfig::new(Backend::Scalar, 16, 0).validate().is_ok());
    assert_eq!(
        KernelConfig::new(Backend::Scalar, 3, 64).validate(),
        Err(KernelError::UnsupportedLanes { lanes: 3, backend: "scalar" })
    );
    assert_eq!(
        KernelConfig::new(Backend::Simd, 4, 64).validate(),
        Err(KernelError::UnsupportedLanes { lanes: 4, backend: "simd" })
    );
    assert_eq!(
        KernelConfig::new(Backend::Rayon, 8, 0).validate(),
        Err(KernelError::InvalidChunkSize)
    );
}

#[test]
fn every_backend_agrees() {
    let market = MarketParams::new(100.0, 105.0, 1.0, 0.05, 0.2);
    let samples = crate::sampler::standard_normals(10_007, 42);
    let reference = crate::reference::sequential_sum(&samples, &market);

    let mut configs: Vec<KernelConfig> = SCALAR_LANES
        .iter()
        .map(|&lanes| KernelConfig::new(Backend::Scalar, lanes, 0))
        .collect();
    configs.push(KernelConfig::new(Backend::Simd, 8, 0));
    configs.push(KernelConfig::new(Backend::Rayon, 8, 1000));

    for config in configs {
        let sum = accumulate(&samples, 10_007, &market, &config).unwrap();
        approx::assert_relative_eq!(sum as f64, reference, max_relative = 1e-4);
    }
}

#[test]
fn errors_surface_through_dispatch() {
    let market = MarketParams::new(100.0, 105.0, 1.0, 0.05, 0.2);
    let config = KernelConfig::default();
    assert_eq!(
        accumulate(&[0.0; 4], -2, &market, &config),
        Err(KernelError::NegativePathCount { num_paths: -2 })
    );
    assert_eq!(
        accumulate(&[0.0; 4], 2, &market, &KernelConfig::new(Backend::Scalar, 5, 0)),
        Err(KernelError::UnsupportedLanes { lanes: 5, backend: "scalar" })
    );
}
