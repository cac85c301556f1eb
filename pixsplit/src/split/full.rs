//! Full split: each pixel is the quadrilateral spanned by its four corners and
//! is divided among bins by exact overlap area.
//!
//! Corners are mapped to fractional bin-index space, where every bin is a unit
//! square. The pixel then falls in one of three cases:
//!
//! - all corners in one bin: coefficient 1;
//! - one bin row or column: closed-form slab integration of the edges;
//! - otherwise: each candidate bin is either fully covered (all four bin
//!   corners inside the pixel) or the pixel is clipped to the bin.
//!
//! Portions of a pixel outside the covered range are dropped without
//! renormalizing, so a pixel straddling the range boundary sums to less than 1.

use glam::DVec2;

use crate::axis::AxisRange;
use crate::axis::wrap::unwrap_corners;
use crate::geometry::{
    Polygon, Rect, SlabAxis, clip_to_rect, convex_hull, polygon_area, slab_areas,
    strictly_inside,
};

use super::{MIN_PIXEL_AREA, PixelSplitter, Scratch, SplitMethod};

/// Pixel corners: `corners[pixel][corner] = [axis0, axis1]`.
pub type Corners = [[f64; 2]; 4];

/// Corner coordinates of one component mapped to fractional bins of `axis`.
#[inline]
fn project(corners: &Corners, component: usize, axis: &AxisRange) -> [f64; 4] {
    let mut values = corners.map(|c| axis.clip_negative(c[component]));
    if axis.wrap {
        unwrap_corners(&mut values);
    }
    values.map(|x| axis.fbin(x))
}

#[inline]
fn min_max(values: &[f64; 4]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

#[inline]
fn all_finite(values: &[f64; 4]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Clamped inclusive bin span `[first, last]` of `[fmin, fmax]`.
#[inline]
fn bin_span(fmin: f64, fmax: f64, bins: usize) -> (usize, usize) {
    let first = fmin.floor().max(0.0) as usize;
    let last = (fmax.floor() as usize).min(bins - 1);
    (first, last)
}

/// Emit per-slab areas along `axis`, normalized by the pixel area.
#[inline]
fn emit_slabs(
    hull: &Polygon,
    axis: SlabAxis,
    first: usize,
    last: usize,
    area: f64,
    scratch: &mut Scratch,
    mut emit: impl FnMut(usize, f64),
) {
    let slabs = scratch.slabs(last - first + 1);
    slab_areas(hull, axis, first as f64, slabs);
    for (k, &a) in slabs.iter().enumerate() {
        if a > 0.0 {
            emit(first + k, (a / area).min(1.0));
        }
    }
}

/// 1D full split along axis 0; axis 1 of the corners is only used for area.
#[derive(Debug, Clone)]
pub struct FullSplit1d<'a> {
    pub corners: &'a [Corners],
    pub axis: AxisRange,
    /// Pixels whose corners lie entirely outside this axis-1 range are skipped.
    pub secondary_range: Option<(f64, f64)>,
}

impl PixelSplitter for FullSplit1d<'_> {
    const METHOD: SplitMethod = SplitMethod::Full;

    fn pixel_count(&self) -> usize {
        self.corners.len()
    }

    fn bin_count(&self) -> usize {
        self.axis.bins
    }

    fn split(&self, pixel: usize, scratch: &mut Scratch, mut emit: impl FnMut(usize, f64)) {
        let corners = &self.corners[pixel];
        let v = corners.map(|c| c[1]);
        let u = project(corners, 0, &self.axis);
        if !all_finite(&u) || !all_finite(&v) {
            return;
        }

        if let Some((lo, hi)) = self.secondary_range {
            let (vmin, vmax) = min_max(&v);
            if vmax < lo || vmin > hi {
                return;
            }
        }

        let bins = self.axis.bins;
        let (umin, umax) = min_max(&u);
        if umax < 0.0 || umin >= bins as f64 {
            return;
        }

        if umin.floor() == umax.floor() {
            emit(umin.floor() as usize, 1.0);
            return;
        }

        let points = [0, 1, 2, 3].map(|k| DVec2::new(u[k], v[k]));
        let hull = convex_hull(&points);
        let area = polygon_area(&hull);
        if area < MIN_PIXEL_AREA {
            return;
        }

        let (first, last) = bin_span(umin, umax, bins);
        emit_slabs(&hull, SlabAxis::X, first, last, area, scratch, emit);
    }
}

/// 2D full split.
#[derive(Debug, Clone)]
pub struct FullSplit2d<'a> {
    pub corners: &'a [Corners],
    pub axes: [AxisRange; 2],
}

impl PixelSplitter for FullSplit2d<'_> {
    const METHOD: SplitMethod = SplitMethod::Full;

    fn pixel_count(&self) -> usize {
        self.corners.len()
    }

    fn bin_count(&self) -> usize {
        self.axes[0].bins * self.axes[1].bins
    }

    fn split(&self, pixel: usize, scratch: &mut Scratch, mut emit: impl FnMut(usize, f64)) {
        let [ax0, ax1] = &self.axes;
        let (bins0, bins1) = (ax0.bins, ax1.bins);
        let corners = &self.corners[pixel];
        let u = project(corners, 0, ax0);
        let v = project(corners, 1, ax1);
        if !all_finite(&u) || !all_finite(&v) {
            return;
        }

        let (umin, umax) = min_max(&u);
        let (vmin, vmax) = min_max(&v);
        if umax < 0.0 || umin >= bins0 as f64 || vmax < 0.0 || vmin >= bins1 as f64 {
            return;
        }

        let single_column = umin.floor() == umax.floor();
        let single_row = vmin.floor() == vmax.floor();
        if single_column && single_row {
            emit(umin.floor() as usize * bins1 + vmin.floor() as usize, 1.0);
            return;
        }

        let points = [0, 1, 2, 3].map(|k| DVec2::new(u[k], v[k]));
        let hull = convex_hull(&points);
        let area = polygon_area(&hull);
        if area < MIN_PIXEL_AREA {
            return;
        }

        let (i_first, i_last) = bin_span(umin, umax, bins0);
        let (j_first, j_last) = bin_span(vmin, vmax, bins1);

        if single_column {
            let i = i_first;
            emit_slabs(&hull, SlabAxis::Y, j_first, j_last, area, scratch, |j, c| {
                emit(i * bins1 + j, c)
            });
            return;
        }

        if single_row {
            let j = j_first;
            emit_slabs(&hull, SlabAxis::X, i_first, i_last, area, scratch, |i, c| {
                emit(i * bins1 + j, c)
            });
            return;
        }

        let inv_area = 1.0 / area;
        for i in i_first..=i_last {
            for j in j_first..=j_last {
                let rect = Rect::unit(i, j);
                let overlap = if rect.corners().iter().all(|&p| strictly_inside(&hull, p)) {
                    1.0
                } else {
                    polygon_area(&clip_to_rect(&hull, &rect))
                };
                if overlap > 0.0 {
                    emit(i * bins1 + j, (overlap * inv_area).min(1.0));
                }
            }
        }
    }
}
