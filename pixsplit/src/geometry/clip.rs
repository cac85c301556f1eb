//! Sutherland-Hodgman clipping of a convex polygon against an axis-aligned bin.

use glam::DVec2;

use super::polygon::{MAX_VERTICES, Polygon};

/// Axis-aligned rectangle `[min.x, max.x] x [min.y, max.y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

impl Rect {
    /// Unit bin `[i, i + 1] x [j, j + 1]` in fractional bin-index space.
    #[inline]
    pub fn unit(i: usize, j: usize) -> Self {
        let min = DVec2::new(i as f64, j as f64);
        Self {
            min,
            max: min + DVec2::ONE,
        }
    }

    #[inline]
    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ]
    }
}

/// Point on segment `a-b` where `x == at`. Caller guarantees `a.x != b.x`.
#[inline]
fn cut_x(a: DVec2, b: DVec2, at: f64) -> DVec2 {
    let t = (at - a.x) / (b.x - a.x);
    DVec2::new(at, a.y + t * (b.y - a.y))
}

/// Point on segment `a-b` where `y == at`. Caller guarantees `a.y != b.y`.
#[inline]
fn cut_y(a: DVec2, b: DVec2, at: f64) -> DVec2 {
    let t = (at - a.y) / (b.y - a.y);
    DVec2::new(a.x + t * (b.x - a.x), at)
}

/// Append a clipped vertex. Convex input gains at most one vertex per
/// half-plane, so four cuts of a hull of at most four corners stay within
/// capacity.
#[inline]
fn push_vertex(out: &mut Polygon, p: DVec2) {
    let pushed = out.try_push(p);
    debug_assert!(
        pushed.is_ok(),
        "clipped polygon exceeds {MAX_VERTICES} vertices"
    );
}

/// Clip against one half-plane.
#[inline]
fn clip_half_plane(
    input: &Polygon,
    inside: impl Fn(DVec2) -> bool,
    cut: impl Fn(DVec2, DVec2) -> DVec2,
) -> Polygon {
    let mut out = Polygon::new();
    let Some(&last) = input.last() else {
        return out;
    };

    let mut prev = last;
    let mut prev_in = inside(prev);
    for &cur in input {
        let cur_in = inside(cur);
        if cur_in {
            if !prev_in {
                push_vertex(&mut out, cut(prev, cur));
            }
            push_vertex(&mut out, cur);
        } else if prev_in {
            push_vertex(&mut out, cut(prev, cur));
        }
        prev = cur;
        prev_in = cur_in;
    }
    out
}

/// Clip a convex polygon to `rect`: left, bottom, right, then top edge.
pub fn clip_to_rect(poly: &Polygon, rect: &Rect) -> Polygon {
    let (x0, y0, x1, y1) = (rect.min.x, rect.min.y, rect.max.x, rect.max.y);
    let left = clip_half_plane(poly, |p| p.x >= x0, |a, b| cut_x(a, b, x0));
    let bottom = clip_half_plane(&left, |p| p.y >= y0, |a, b| cut_y(a, b, y0));
    let right = clip_half_plane(&bottom, |p| p.x <= x1, |a, b| cut_x(a, b, x1));
    clip_half_plane(&right, |p| p.y <= y1, |a, b| cut_y(a, b, y1))
}
