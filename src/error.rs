use thiserror::Error;

/// Errors reported by the payoff accumulators.
///
/// Numeric anomalies (NaN or infinite inputs) are not errors: they flow
/// through to the returned sum.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("path count must be non-negative, got {num_paths}")]
    NegativePathCount { num_paths: i64 },

    #[error("{required} paths requested but only {available} samples supplied")]
    InsufficientSamples { required: usize, available: usize },

    #[error("{lanes} lanes not supported by the {backend} backend")]
    UnsupportedLanes { lanes: usize, backend: &'static str },

    #[error("chunk size must be at least one sample")]
    InvalidChunkSize,

    #[error("unknown backend `{0}`, expected one of scalar, simd, rayon")]
    UnknownBackend(String),
}

pub type Result<T> = std::result::Result<T, KernelError>;

/// Converts the signed path count and checks it against the sample slice.
pub(crate) fn checked_path_count(samples: &[f32], num_paths: i64) -> Result<usize> {
    let n = usize::try_from(num_paths)
        .map_err(|_| KernelError::NegativePathCount { num_paths })?;

    if samples.len() < n {
        return Err(KernelError::InsufficientSamples {
            required: n,
            available: samples.len(),
        });
    }

    Ok(n)
}

#[test]
fn negative_path_count_rejected() {
    let err = checked_path_count(&[0.0; 4], -1).unwrap_err();
    assert_eq!(err, KernelError::NegativePathCount { num_paths: -1 });
}

#[test]
fn short_sample_slice_rejected() {
    let err = checked_path_count(&[0.0; 4], 5).unwrap_err();
    assert_eq!(err, KernelError::InsufficientSamples { required: 5, available: 4 });
}

#[test]
fn longer_slice_is_fine() {
    assert_eq!(checked_path_count(&[0.0; 4], 3), Ok(3));
    assert_eq!(checked_path_count(&[], 0), Ok(0));
}
