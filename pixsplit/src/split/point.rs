//! No-split strategy: every pixel goes whole into the bin holding its center.

use crate::axis::AxisRange;

use super::{PixelSplitter, Scratch, SecondaryFilter, SplitMethod};

/// 1D histogram of pixel centers.
#[derive(Debug, Clone)]
pub struct PointSplit1d<'a> {
    pub pos0: &'a [f64],
    pub axis: AxisRange,
    pub filter: Option<SecondaryFilter<'a>>,
}

impl PixelSplitter for PointSplit1d<'_> {
    const METHOD: SplitMethod = SplitMethod::NoSplit;

    fn pixel_count(&self) -> usize {
        self.pos0.len()
    }

    fn bin_count(&self) -> usize {
        self.axis.bins
    }

    #[inline]
    fn split(&self, pixel: usize, _scratch: &mut Scratch, mut emit: impl FnMut(usize, f64)) {
        if self.filter.is_some_and(|f| f.rejects(pixel)) {
            return;
        }
        if let Some(bin) = self.axis.bin_of(self.pos0[pixel]) {
            emit(bin, 1.0);
        }
    }
}

/// 2D histogram of pixel centers.
#[derive(Debug, Clone)]
pub struct PointSplit2d<'a> {
    pub pos0: &'a [f64],
    pub pos1: &'a [f64],
    pub axes: [AxisRange; 2],
}

impl PixelSplitter for PointSplit2d<'_> {
    const METHOD: SplitMethod = SplitMethod::NoSplit;

    fn pixel_count(&self) -> usize {
        self.pos0.len()
    }

    fn bin_count(&self) -> usize {
        self.axes[0].bins * self.axes[1].bins
    }

    #[inline]
    fn split(&self, pixel: usize, _scratch: &mut Scratch, mut emit: impl FnMut(usize, f64)) {
        let [ax0, ax1] = &self.axes;
        if let (Some(i), Some(j)) = (ax0.bin_of(self.pos0[pixel]), ax1.bin_of(self.pos1[pixel])) {
            emit(i * ax1.bins + j, 1.0);
        }
    }
}
