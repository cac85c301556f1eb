use common::parallel::{ParChunksMutAuto, par_zip_chunks_mut_auto};
use rayon::prelude::*;

use super::IntegrationOptions;

/// Frame after corrections, ready for reduction.
#[derive(Debug, Clone)]
pub struct CorrectedFrame {
    pub values: Vec<f32>,
    pub variance: Option<Vec<f32>>,
}

/// Correct one pixel. Returns the corrected value and the factor its variance
/// is divided by, or `None` if the pixel is invalid.
#[inline]
fn correct_pixel(value: f32, i: usize, opts: &IntegrationOptions) -> Option<(f32, f32)> {
    if opts.dummy.is_some_and(|d| d.matches(value)) {
        return None;
    }

    let mut v = value;
    let mut divisor = 1.0f32;
    if let Some(dark) = opts.dark {
        v -= dark[i];
    }
    for correction in [opts.flat, opts.polarization, opts.solid_angle]
        .into_iter()
        .flatten()
    {
        v /= correction[i];
        divisor *= correction[i];
    }

    v.is_finite().then_some((v, divisor))
}

/// Apply dark, flat, polarization and solid-angle corrections in that order.
///
/// A pixel matching the dummy is forced to the dummy value. A pixel whose
/// corrected value is not finite (e.g. a zero flat) becomes the dummy value
/// if one is configured, NaN otherwise; the reducer skips both.
///
/// Array lengths must already be validated against `data`.
pub fn correct(data: &[f32], opts: &IntegrationOptions) -> CorrectedFrame {
    let invalid = opts.dummy.map_or(f32::NAN, |d| d.value);
    let mut values = data.to_vec();

    let variance = match opts.variance {
        Some(var) => {
            let mut variance = var.to_vec();
            par_zip_chunks_mut_auto(&mut values, &mut variance).for_each(
                |(start, (values, variance))| {
                    for (k, (v, var)) in values.iter_mut().zip(variance.iter_mut()).enumerate() {
                        match correct_pixel(*v, start + k, opts) {
                            Some((corrected, divisor)) => {
                                *v = corrected;
                                *var /= divisor * divisor;
                            }
                            None => {
                                *v = invalid;
                                *var = 0.0;
                            }
                        }
                    }
                },
            );
            Some(variance)
        }
        None => {
            values.par_chunks_mut_auto().for_each(|(start, values)| {
                for (k, v) in values.iter_mut().enumerate() {
                    *v = correct_pixel(*v, start + k, opts).map_or(invalid, |(c, _)| c);
                }
            });
            None
        }
    };

    CorrectedFrame { values, variance }
}
