use common::parallel::ParChunksMutAuto;
use rayon::prelude::*;

use crate::sparse::SparseMatrix;

use super::{CorrectedFrame, IntegrationOptions};

/// Bins whose coverage does not exceed this are reported as empty.
pub const EMPTY_COVERAGE_EPSILON: f64 = 1e-10;

/// Accumulated sums of one bin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Accumulator {
    sum: f64,
    coverage: f64,
    variance: f64,
}

/// Per-bin reduction output.
#[derive(Debug, Clone)]
pub struct BinSums {
    /// Normalized profile: `sum / coverage / normalization_factor`.
    pub merged: Vec<f32>,
    /// `Σ c^p · value`.
    pub sum: Vec<f64>,
    /// `Σ c`.
    pub coverage: Vec<f64>,
    /// `Σ c² · var`, when a variance was supplied.
    pub sum_variance: Option<Vec<f64>>,
    /// `sqrt(sum_variance) / coverage / normalization_factor`.
    pub sigma: Option<Vec<f32>>,
}

#[inline]
fn accumulate<M: SparseMatrix + ?Sized>(
    matrix: &M,
    bin: usize,
    frame: &CorrectedFrame,
    opts: &IntegrationOptions,
) -> Accumulator {
    let mut acc = Accumulator::default();
    for (pixel, coef) in matrix.row(bin) {
        if coef == 0.0 {
            continue;
        }
        let v = frame.values[pixel];
        if !v.is_finite() || opts.dummy.is_some_and(|d| v == d.value) {
            continue;
        }
        let c = coef as f64;
        acc.sum += c.powi(opts.coef_power) * v as f64;
        acc.coverage += c;
        if let Some(var) = &frame.variance {
            acc.variance += c * c * var[pixel] as f64;
        }
    }
    acc
}

/// Reduce a corrected frame through `matrix`, one bin per task.
pub fn reduce<M: SparseMatrix + ?Sized>(
    matrix: &M,
    frame: &CorrectedFrame,
    opts: &IntegrationOptions,
) -> BinSums {
    let bins = matrix.bin_count();
    let mut acc = vec![Accumulator::default(); bins];
    acc.par_chunks_mut_auto().for_each(|(start, chunk)| {
        for (k, slot) in chunk.iter_mut().enumerate() {
            *slot = accumulate(matrix, start + k, frame, opts);
        }
    });

    let empty = opts.empty_value();
    let norm = opts.normalization_factor;
    let normalize = |value: f64, coverage: f64| {
        if coverage > EMPTY_COVERAGE_EPSILON {
            (value / coverage / norm) as f32
        } else {
            empty
        }
    };

    let merged: Vec<f32> = acc.par_iter().map(|a| normalize(a.sum, a.coverage)).collect();
    let sum = acc.iter().map(|a| a.sum).collect();
    let coverage = acc.iter().map(|a| a.coverage).collect();
    let (sum_variance, sigma) = match frame.variance {
        Some(_) => (
            Some(acc.iter().map(|a| a.variance).collect()),
            Some(
                acc.iter()
                    .map(|a| normalize(a.variance.sqrt(), a.coverage))
                    .collect(),
            ),
        ),
        None => (None, None),
    };

    let empty_bins = acc
        .iter()
        .filter(|a| a.coverage <= EMPTY_COVERAGE_EPSILON)
        .count();
    tracing::debug!(bins, empty_bins, "Reduced frame");

    BinSums {
        merged,
        sum,
        coverage,
        sum_variance,
        sigma,
    }
}
