//! Per-frame integration through a built sparse matrix.
//!
//! A frame goes through two parallel stages:
//!
//! 1. [`correct`]: dark subtraction, then division by flat, polarization and
//!    solid angle, with dummy detection (parallel over pixels).
//! 2. [`reduce`]: weighted sums and coverage per bin, normalized into the
//!    merged profile (parallel over bins).
//!
//! Summation order within a bin follows the row order of the matrix, so
//! results are deterministic for a given matrix. Different backends or thread
//! counts never change a bin's summation order.

mod correction;
mod reduce;
mod result;


use crate::error::{Error, Result, check_len};

pub use correction::{CorrectedFrame, correct};
pub use reduce::{BinSums, EMPTY_COVERAGE_EPSILON, reduce};
pub use result::{Integrate1dResult, Integrate2dResult};

/// Sentinel marking an invalid reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dummy {
    pub value: f32,
    /// Tolerance around `value`. Zero means exact equality.
    pub delta: f32,
}

impl Dummy {
    pub fn new(value: f32) -> Self {
        Self { value, delta: 0.0 }
    }

    pub fn with_delta(value: f32, delta: f32) -> Self {
        Self {
            value,
            delta: delta.abs(),
        }
    }

    #[inline]
    pub fn matches(&self, v: f32) -> bool {
        if self.delta == 0.0 {
            v == self.value
        } else {
            (v - self.value).abs() <= self.delta
        }
    }
}

/// Per-call integration options. Corrections and variance are borrowed for
/// the duration of the call and must have one entry per pixel.
#[derive(Debug, Clone, Copy)]
pub struct IntegrationOptions<'a> {
    pub dummy: Option<Dummy>,
    /// Value reported for empty bins when no dummy is configured.
    pub empty: f32,
    pub normalization_factor: f64,
    /// Exponent applied to each coefficient in the weighted sum.
    pub coef_power: i32,
    pub dark: Option<&'a [f32]>,
    pub flat: Option<&'a [f32]>,
    pub solid_angle: Option<&'a [f32]>,
    pub polarization: Option<&'a [f32]>,
    /// Per-pixel variance, propagated as `Σ c² · var`.
    pub variance: Option<&'a [f32]>,
}

impl Default for IntegrationOptions<'_> {
    fn default() -> Self {
        Self {
            dummy: None,
            empty: 0.0,
            normalization_factor: 1.0,
            coef_power: 1,
            dark: None,
            flat: None,
            solid_angle: None,
            polarization: None,
            variance: None,
        }
    }
}

impl<'a> IntegrationOptions<'a> {
    pub fn with_dummy(mut self, dummy: Dummy) -> Self {
        self.dummy = Some(dummy);
        self
    }

    pub fn with_empty(mut self, empty: f32) -> Self {
        self.empty = empty;
        self
    }

    pub fn with_normalization_factor(mut self, factor: f64) -> Self {
        self.normalization_factor = factor;
        self
    }

    pub fn with_coef_power(mut self, power: i32) -> Self {
        self.coef_power = power;
        self
    }

    pub fn with_dark(mut self, dark: &'a [f32]) -> Self {
        self.dark = Some(dark);
        self
    }

    pub fn with_flat(mut self, flat: &'a [f32]) -> Self {
        self.flat = Some(flat);
        self
    }

    pub fn with_solid_angle(mut self, solid_angle: &'a [f32]) -> Self {
        self.solid_angle = Some(solid_angle);
        self
    }

    pub fn with_polarization(mut self, polarization: &'a [f32]) -> Self {
        self.polarization = Some(polarization);
        self
    }

    pub fn with_variance(mut self, variance: &'a [f32]) -> Self {
        self.variance = Some(variance);
        self
    }

    /// Value reported for bins without coverage.
    #[inline]
    pub fn empty_value(&self) -> f32 {
        self.dummy.map_or(self.empty, |d| d.value)
    }

    /// Check that every per-pixel array has `pixels` entries and that the
    /// normalization factor can divide.
    pub fn validate(&self, pixels: usize) -> Result<()> {
        let factor = self.normalization_factor;
        if factor == 0.0 || !factor.is_finite() {
            return Err(Error::InvalidNormalization { factor });
        }
        let arrays = [
            ("dark", self.dark),
            ("flat", self.flat),
            ("solid_angle", self.solid_angle),
            ("polarization", self.polarization),
            ("variance", self.variance),
        ];
        for (what, array) in arrays {
            if let Some(array) = array {
                check_len(what, pixels, array.len())?;
            }
        }
        Ok(())
    }
}
