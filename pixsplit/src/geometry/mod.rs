//! Planar geometry in fractional bin-index space.
//!
//! Polygons are bounded: a convex pixel quadrilateral clipped against the four
//! sides of a rectangular bin gains at most one vertex per side, so every
//! polygon fits in [`MAX_VERTICES`] and lives on the stack.

pub mod clip;
pub mod polygon;
pub mod slab;


pub use clip::{Rect, clip_to_rect};
pub use polygon::{MAX_VERTICES, Polygon, convex_hull, polygon_area, signed_area, strictly_inside};
pub use slab::{SlabAxis, integrate_edge, slab_areas};
