//! Error types for matrix construction and integration.

use thiserror::Error;

/// Errors raised while resolving ranges, building the sparse matrix or
/// validating per-frame inputs. All of them are fatal for the call that
/// produced them; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Axis {axis} has zero bins")]
    ZeroBins { axis: usize },

    #[error("Axis {axis} resolved to an empty or non-finite range [{min}, {max}]")]
    EmptyRange { axis: usize, min: f64, max: f64 },

    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("No unmasked pixel with finite coordinates to derive a range from")]
    NoValidPixels,

    #[error("Sparse matrix would be empty: no pixel contributes to any bin")]
    EmptyMatrix,

    #[error("Pixel count {count} exceeds the u32 index range of sparse entries")]
    TooManyPixels { count: usize },

    #[error("Sparse matrix needs {required} bytes but only {available} bytes are available")]
    InsufficientMemory { required: u64, available: u64 },

    #[error("Normalization factor must be finite and non-zero, got {factor}")]
    InvalidNormalization { factor: f64 },

    #[error("Shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Fail with [`Error::LengthMismatch`] unless `actual == expected`.
#[inline]
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}
