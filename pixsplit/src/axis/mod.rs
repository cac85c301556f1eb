//! Output axis: range resolution and coordinate-to-bin mapping.
//!
//! An [`AxisRange`] is resolved once from pixel geometry (or an explicit
//! range) and then maps continuous coordinates to fractional bin indices
//! `(x - min) / width`. The maximum is inflated by a relative epsilon so a
//! pixel sitting exactly on the largest coordinate still lands in the last bin.

pub mod wrap;


use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::AxisConfig;
use crate::error::{Error, Result};

/// Relative inflation applied to the upper bound (single-precision epsilon).
pub const MAX_INFLATION: f64 = f32::EPSILON as f64;

/// Resolved, uniform binning of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    /// Lower bound of bin 0.
    pub min: f64,
    /// Upper bound of the last bin, already inflated.
    pub max: f64,
    /// Width of a bin.
    pub width: f64,
    /// Number of bins.
    pub bins: usize,
    /// Whether quadrilateral pixels are unwrapped at ±π on this axis.
    pub wrap: bool,
    /// Whether pixel extents are clipped at zero on this axis.
    pub allow_negative: bool,
}

impl AxisRange {
    /// Build a range from an inclusive `[min, max]` span, inflating `max`.
    pub fn from_bounds(axis: usize, min: f64, max: f64, config: &AxisConfig) -> Result<Self> {
        if config.bins == 0 {
            return Err(Error::ZeroBins { axis });
        }

        let min = if !config.allow_negative && min < 0.0 {
            0.0
        } else {
            min
        };

        let scale = max.abs().max(max - min);
        let max = max + scale * MAX_INFLATION;
        let width = (max - min) / config.bins as f64;

        if !(min.is_finite() && max.is_finite() && width > 0.0 && width.is_finite()) {
            return Err(Error::EmptyRange { axis, min, max });
        }

        Ok(Self {
            min,
            max,
            width,
            bins: config.bins,
            wrap: config.wrap,
            allow_negative: config.allow_negative,
        })
    }

    /// Resolve the range of an axis from per-pixel extents.
    ///
    /// `extent(i)` returns the `(lo, hi)` coordinate interval covered by pixel
    /// `i`, or `None` when the pixel is masked. Non-finite extents are ignored.
    /// An explicit range in `config` takes precedence over the scan.
    pub fn resolve<F>(axis: usize, config: &AxisConfig, pixel_count: usize, extent: F) -> Result<Self>
    where
        F: Fn(usize) -> Option<(f64, f64)> + Sync + Send,
    {
        config.validate(axis)?;

        let (min, max) = match config.ordered_range() {
            Some(range) => range,
            None => (0..pixel_count)
                .into_par_iter()
                .filter_map(&extent)
                .filter(|(lo, hi)| lo.is_finite() && hi.is_finite())
                .map(|(lo, hi)| (lo.min(hi), lo.max(hi)))
                .reduce_with(|a, b| (a.0.min(b.0), a.1.max(b.1)))
                .ok_or(Error::NoValidPixels)?,
        };

        let range = Self::from_bounds(axis, min, max, config)?;
        tracing::debug!(
            axis,
            min = range.min,
            max = range.max,
            width = range.width,
            bins = range.bins,
            explicit = config.range.is_some(),
            "Resolved axis range"
        );
        Ok(range)
    }

    /// Fractional bin index of coordinate `x`. Bin `k` covers `[k, k + 1)`.
    #[inline]
    pub fn fbin(&self, x: f64) -> f64 {
        (x - self.min) / self.width
    }

    /// Bin holding point `x`, or `None` if `x` lies outside `[min, max)`.
    #[inline]
    pub fn bin_of(&self, x: f64) -> Option<usize> {
        let f = self.fbin(x);
        if f >= 0.0 && f < self.bins as f64 {
            Some((f as usize).min(self.bins - 1))
        } else {
            None
        }
    }

    /// Clip a coordinate at zero when negatives are not allowed on this axis.
    #[inline]
    pub fn clip_negative(&self, x: f64) -> f64 {
        if self.allow_negative { x } else { x.max(0.0) }
    }

    /// Coordinates of the bin centers.
    pub fn centers(&self) -> Vec<f64> {
        (0..self.bins)
            .map(|i| self.min + (i as f64 + 0.5) * self.width)
            .collect()
    }

    /// Coordinates of the `bins + 1` bin edges.
    pub fn edges(&self) -> Vec<f64> {
        (0..=self.bins)
            .map(|i| self.min + i as f64 * self.width)
            .collect()
    }
}
