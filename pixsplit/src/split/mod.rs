//! Pixel-to-bin overlap strategies.
//!
//! A [`PixelSplitter`] reports, for one pixel, every output bin it overlaps
//! together with the fraction of the pixel's area falling in that bin. Three
//! strategies of increasing fidelity are provided, each in 1D and 2D:
//!
//! - [`point`]: the pixel is a point and goes whole into one bin.
//! - [`bbox`]: the pixel is an interval per axis, split linearly.
//! - [`full`]: the pixel is a quadrilateral, split by exact area.
//!
//! 2D bins are flattened row-major: `bin = i0 * bins1 + i1`.

pub mod bbox;
pub mod full;
pub mod point;


use serde::{Deserialize, Serialize};

pub use bbox::{BoxSplit1d, BoxSplit2d, split_interval};
pub use full::{FullSplit1d, FullSplit2d};
pub use point::{PointSplit1d, PointSplit2d};

/// Pixels whose area in bin-index space is below this are skipped when they
/// would have to be divided among several bins.
pub const MIN_PIXEL_AREA: f64 = 1e-30;

/// Which overlap strategy a splitter implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitMethod {
    /// Whole pixel to the bin holding its center.
    NoSplit,
    /// Linear split of the pixel's bounding interval(s).
    BoundingBox,
    /// Exact area split of the pixel quadrilateral.
    Full,
}

/// Per-worker scratch space reused across pixels.
#[derive(Debug, Default)]
pub struct Scratch {
    pub(crate) slabs: Vec<f64>,
}

impl Scratch {
    /// Zeroed slab buffer of length `len`.
    pub(crate) fn slabs(&mut self, len: usize) -> &mut [f64] {
        self.slabs.clear();
        self.slabs.resize(len, 0.0);
        &mut self.slabs
    }
}

/// Computes the bins a pixel contributes to and with which coefficient.
pub trait PixelSplitter: Sync {
    const METHOD: SplitMethod;

    /// Number of pixels this splitter describes.
    fn pixel_count(&self) -> usize;

    /// Total number of (flattened) output bins.
    fn bin_count(&self) -> usize;

    /// Call `emit(bin, coefficient)` for each bin the pixel overlaps.
    ///
    /// Bins are emitted in ascending order and at most once; coefficients
    /// are in `(0, 1]` up to rounding, though callers should still skip
    /// non-positive values.
    fn split(&self, pixel: usize, scratch: &mut Scratch, emit: impl FnMut(usize, f64));
}

/// Excludes pixels of a 1D integration by their secondary coordinate.
///
/// A pixel is kept if its secondary extent `[pos1 - delta1, pos1 + delta1]`
/// intersects `range`. For quadrilateral pixels the extent comes from the
/// corners and `pos1`/`delta1` are not used.
#[derive(Debug, Clone, Copy)]
pub struct SecondaryFilter<'a> {
    pub pos1: Option<&'a [f64]>,
    pub delta1: Option<&'a [f64]>,
    pub range: (f64, f64),
}

impl<'a> SecondaryFilter<'a> {
    pub fn new(range: (f64, f64)) -> Self {
        Self {
            pos1: None,
            delta1: None,
            range: (range.0.min(range.1), range.0.max(range.1)),
        }
    }

    pub fn with_positions(mut self, pos1: &'a [f64]) -> Self {
        self.pos1 = Some(pos1);
        self
    }

    pub fn with_half_widths(mut self, delta1: &'a [f64]) -> Self {
        self.delta1 = Some(delta1);
        self
    }

    /// True if the extent `[lo, hi]` lies entirely outside the range.
    #[inline]
    pub fn rejects_extent(&self, lo: f64, hi: f64) -> bool {
        hi < self.range.0 || lo > self.range.1
    }

    /// True if pixel `i` is excluded. Pixels without positions are kept.
    #[inline]
    pub fn rejects(&self, i: usize) -> bool {
        let Some(pos1) = self.pos1 else {
            return false;
        };
        let d = self.delta1.map_or(0.0, |d| d[i].abs());
        self.rejects_extent(pos1[i] - d, pos1[i] + d)
    }
}
