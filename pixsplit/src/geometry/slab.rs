//! Closed-form overlap of a polygon with a row of unit-width slabs.
//!
//! When a pixel touches only one row (or column) of bins, the overlap with
//! each bin is the area of the pixel inside a slab `k <= u < k + 1`. Summing
//! the integral of every edge line `v = slope * u + intercept` over the
//! slab-clipped `u` interval gives that area directly (Green's theorem; the
//! slab walls contribute nothing because `du = 0` along them).

use glam::DVec2;

use super::polygon::Polygon;

/// Coordinate the slabs are cut along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlabAxis {
    /// Slabs are columns `k <= x < k + 1`.
    X,
    /// Slabs are rows `k <= y < k + 1`.
    Y,
}

/// Accumulate `∫ (slope * u + intercept) du` from `start` to `stop` into
/// unit slabs of `buffer` (slab `k` covers `[k, k + 1)`).
///
/// Integrating right to left contributes with negative sign. Parts of the
/// interval outside `[0, buffer.len())` are dropped.
pub fn integrate_edge(buffer: &mut [f64], start: f64, stop: f64, slope: f64, intercept: f64) {
    let (lo, hi, sign) = if start < stop {
        (start, stop, 1.0)
    } else if start > stop {
        (stop, start, -1.0)
    } else {
        return;
    };

    let len = buffer.len();
    let lo = lo.max(0.0);
    let hi = hi.min(len as f64);
    if lo >= hi {
        return;
    }

    let mut u = lo;
    while u < hi {
        let slab = u.floor();
        let next = (slab + 1.0).min(hi);
        let idx = (slab as usize).min(len - 1);
        let mid = 0.5 * (u + next);
        buffer[idx] += sign * (slope * mid + intercept) * (next - u);
        u = next;
    }
}

/// Area of `poly` inside each unit slab along `axis`, written to `buffer`.
///
/// Slab `k` of the buffer is `[offset + k, offset + k + 1)` along `axis`.
/// Portions of the polygon outside the buffer's slabs are dropped. `buffer`
/// is overwritten.
pub fn slab_areas(poly: &Polygon, axis: SlabAxis, offset: f64, buffer: &mut [f64]) {
    buffer.fill(0.0);
    let n = poly.len();
    if n < 3 {
        return;
    }

    let project = |p: DVec2| match axis {
        SlabAxis::X => DVec2::new(p.x - offset, p.y),
        SlabAxis::Y => DVec2::new(p.y - offset, p.x),
    };

    // Shift the integrand so edge values stay small; the closed contour makes
    // the shift cancel out.
    let base = project(poly[0]).y;

    for i in 0..n {
        let a = project(poly[i]);
        let b = project(poly[if i + 1 == n { 0 } else { i + 1 }]);
        let du = b.x - a.x;
        if du == 0.0 {
            continue;
        }
        let slope = (b.y - a.y) / du;
        let intercept = (a.y - base) - slope * a.x;
        integrate_edge(buffer, a.x, b.x, slope, intercept);
    }

    for v in buffer.iter_mut() {
        *v = v.abs();
    }
}
