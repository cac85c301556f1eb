use arrayvec::ArrayVec;
use glam::DVec2;

/// Maximum number of vertices a clipped pixel polygon can have.
pub const MAX_VERTICES: usize = 8;

/// Fixed-capacity polygon (vertex list with explicit length, no heap).
pub type Polygon = ArrayVec<DVec2, MAX_VERTICES>;

/// Cross product of `(a - o)` and `(b - o)`. Positive when `o -> a -> b` turns left.
#[inline]
fn cross(o: DVec2, a: DVec2, b: DVec2) -> f64 {
    (a - o).perp_dot(b - o)
}

/// Signed area via the shoelace formula. Positive for counterclockwise winding.
#[inline]
pub fn signed_area(poly: &[DVec2]) -> f64 {
    let n = poly.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = if i + 1 == n { 0 } else { i + 1 };
        sum += poly[i].perp_dot(poly[j]);
    }
    0.5 * sum
}

/// Unsigned area of a polygon.
#[inline]
pub fn polygon_area(poly: &[DVec2]) -> f64 {
    signed_area(poly).abs()
}

/// Counterclockwise convex hull of four points (monotone chain).
///
/// For a convex quadrilateral this is the quadrilateral itself, reordered.
/// A non-convex or self-intersecting corner list collapses to its hull, so
/// the clipper always sees convex input. Collinear and duplicate points are
/// dropped; a degenerate pixel yields fewer than 3 vertices and zero area.
pub fn convex_hull(points: &[DVec2; 4]) -> Polygon {
    let mut pts = *points;
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

    let mut hull = Polygon::new();
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }

    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }

    // Closing point repeats the first.
    hull.pop();
    hull
}

/// True if `p` lies strictly inside a counterclockwise convex polygon.
/// Points on an edge count as outside.
#[inline]
pub fn strictly_inside(poly: &[DVec2], p: DVec2) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }
    (0..n).all(|i| {
        let j = if i + 1 == n { 0 } else { i + 1 };
        cross(poly[i], poly[j], p) > 0.0
    })
}
