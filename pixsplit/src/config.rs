//! Configuration types for matrix construction.
//!
//! Per-frame options live in [`crate::integrate`]; everything here is fixed for
//! the lifetime of an integrator.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Axis configuration
// =============================================================================

/// Binning of one output axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Number of uniform bins.
    pub bins: usize,
    /// Explicit coordinate range. `None` derives it from unmasked pixels.
    /// The pair may be given in either order.
    pub range: Option<(f64, f64)>,
    /// When false, negative coordinates are clamped to zero: the range minimum
    /// never goes below 0 and pixel extents are clipped at 0.
    pub allow_negative: bool,
    /// Angular axis in radians with its discontinuity at ±π. Quadrilateral
    /// pixels straddling the discontinuity are unwrapped before binning.
    pub wrap: bool,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            bins: 100,
            range: None,
            allow_negative: true,
            wrap: false,
        }
    }
}

impl AxisConfig {
    pub fn new(bins: usize) -> Self {
        Self {
            bins,
            ..Default::default()
        }
    }

    /// Radial axis preset: negative coordinates disallowed.
    pub fn radial(bins: usize) -> Self {
        Self {
            bins,
            allow_negative: false,
            ..Default::default()
        }
    }

    /// Azimuthal axis preset: wraps at ±π.
    pub fn azimuthal(bins: usize) -> Self {
        Self {
            bins,
            wrap: true,
            ..Default::default()
        }
    }

    pub fn with_range(mut self, a: f64, b: f64) -> Self {
        self.range = Some((a, b));
        self
    }

    pub fn with_allow_negative(mut self, allow_negative: bool) -> Self {
        self.allow_negative = allow_negative;
        self
    }

    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    /// Explicit range ordered as `(min, max)`.
    pub fn ordered_range(&self) -> Option<(f64, f64)> {
        self.range.map(|(a, b)| (a.min(b), a.max(b)))
    }

    /// Validate configuration parameters. `axis` is used in error reports.
    pub fn validate(&self, axis: usize) -> Result<()> {
        if self.bins == 0 {
            return Err(Error::ZeroBins { axis });
        }
        if let Some((min, max)) = self.ordered_range() {
            if !(min.is_finite() && max.is_finite() && max > min) {
                return Err(Error::EmptyRange { axis, min, max });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Build configuration
// =============================================================================

/// Sparse-matrix backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StorageKind {
    /// Dense per-bin table with fixed row capacity (padded with zero entries).
    Lut,
    /// Compressed rows: row pointers into shared index and coefficient arrays.
    #[default]
    Csr,
}

/// Settings for building the sparse matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub storage: StorageKind,
    /// Available memory override in bytes. If None, queries the system.
    pub available_memory: Option<u64>,
}

impl BuildConfig {
    pub fn lut() -> Self {
        Self {
            storage: StorageKind::Lut,
            ..Default::default()
        }
    }

    pub fn csr() -> Self {
        Self::default()
    }

    pub fn with_available_memory(mut self, bytes: u64) -> Self {
        self.available_memory = Some(bytes);
        self
    }
}
