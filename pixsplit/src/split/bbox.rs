//! Bounding-box strategy: each pixel is an interval `pos ± delta` per axis and
//! is spread over the bins it spans in proportion to the covered length.
//!
//! Out-of-range parts of a pixel that is only partly outside are folded into
//! the edge bin, so the coefficients of every kept pixel sum to 1. A pixel
//! entirely outside the range contributes nothing.

use crate::axis::AxisRange;

use super::{PixelSplitter, Scratch, SecondaryFilter, SplitMethod};

/// Split the fractional interval `[fmin, fmax]` over unit bins `0..bins`.
///
/// Edge bins receive their partial length, interior bins `1 / (fmax - fmin)`.
/// Bin indices are clamped into `[0, bins - 1]`.
#[inline]
pub fn split_interval(fmin: f64, fmax: f64, bins: usize, mut emit: impl FnMut(usize, f64)) {
    if !(fmin.is_finite() && fmax.is_finite()) || fmax < 0.0 || fmin >= bins as f64 {
        return;
    }

    let last = bins as isize - 1;
    let bin_min = (fmin.floor() as isize).clamp(0, last);
    let bin_max = (fmax.floor() as isize).clamp(0, last);

    if bin_min == bin_max {
        emit(bin_min as usize, 1.0);
        return;
    }

    let inv_len = 1.0 / (fmax - fmin);
    let left = (bin_min + 1) as f64 - fmin;
    let right = fmax - bin_max as f64;

    emit(bin_min as usize, left * inv_len);
    for bin in (bin_min + 1)..bin_max {
        emit(bin as usize, inv_len);
    }
    emit(bin_max as usize, right * inv_len);
}

/// Fractional bin interval of `center ± delta` on `axis`.
#[inline]
fn fbin_interval(axis: &AxisRange, center: f64, delta: f64) -> (f64, f64) {
    let delta = delta.abs();
    let lo = axis.clip_negative(center - delta);
    let hi = center + delta;
    (axis.fbin(lo), axis.fbin(hi))
}

/// 1D bounding-box split.
#[derive(Debug, Clone)]
pub struct BoxSplit1d<'a> {
    pub pos0: &'a [f64],
    pub delta0: &'a [f64],
    pub axis: AxisRange,
    pub filter: Option<SecondaryFilter<'a>>,
}

impl PixelSplitter for BoxSplit1d<'_> {
    const METHOD: SplitMethod = SplitMethod::BoundingBox;

    fn pixel_count(&self) -> usize {
        self.pos0.len()
    }

    fn bin_count(&self) -> usize {
        self.axis.bins
    }

    #[inline]
    fn split(&self, pixel: usize, _scratch: &mut Scratch, emit: impl FnMut(usize, f64)) {
        if self.filter.is_some_and(|f| f.rejects(pixel)) {
            return;
        }
        let (fmin, fmax) = fbin_interval(&self.axis, self.pos0[pixel], self.delta0[pixel]);
        split_interval(fmin, fmax, self.axis.bins, emit);
    }
}

/// 2D bounding-box split: tensor product of the two 1D splits.
#[derive(Debug, Clone)]
pub struct BoxSplit2d<'a> {
    pub pos0: &'a [f64],
    pub delta0: &'a [f64],
    pub pos1: &'a [f64],
    pub delta1: &'a [f64],
    pub axes: [AxisRange; 2],
}

impl PixelSplitter for BoxSplit2d<'_> {
    const METHOD: SplitMethod = SplitMethod::BoundingBox;

    fn pixel_count(&self) -> usize {
        self.pos0.len()
    }

    fn bin_count(&self) -> usize {
        self.axes[0].bins * self.axes[1].bins
    }

    #[inline]
    fn split(&self, pixel: usize, _scratch: &mut Scratch, mut emit: impl FnMut(usize, f64)) {
        let [ax0, ax1] = &self.axes;
        let (f0min, f0max) = fbin_interval(ax0, self.pos0[pixel], self.delta0[pixel]);
        let (f1min, f1max) = fbin_interval(ax1, self.pos1[pixel], self.delta1[pixel]);

        // Reject early so the outer loop never emits half a pixel.
        if !(f1min.is_finite() && f1max.is_finite()) || f1max < 0.0 || f1min >= ax1.bins as f64 {
            return;
        }

        let bins1 = ax1.bins;
        split_interval(f0min, f0max, ax0.bins, |i, wi| {
            split_interval(f1min, f1max, bins1, |j, wj| emit(i * bins1 + j, wi * wj));
        });
    }
}
