//! Integrators: one resolved geometry plus its sparse matrix, reused across
//! frames.
//!
//! Construction resolves the axis ranges from unmasked pixels, picks the
//! splitter matching the pixel description and builds the matrix. Frames are
//! then integrated any number of times, concurrently if needed; the matrix is
//! never mutated after construction.

use crate::axis::AxisRange;
use crate::config::{AxisConfig, BuildConfig};
use crate::error::{Error, Result, check_len};
use crate::integrate::{Integrate1dResult, Integrate2dResult, IntegrationOptions, correct, reduce};
use crate::sparse::{self, SparseMatrix, SparseStorage, mask_checksum};
use crate::split::full::Corners;
use crate::split::{
    BoxSplit1d, BoxSplit2d, FullSplit1d, FullSplit2d, PointSplit1d, PointSplit2d, SecondaryFilter,
    SplitMethod,
};

/// Pixel geometry for 1D integration.
#[derive(Debug, Clone, Copy)]
pub enum Pixels1d<'a> {
    /// Pixel centers only.
    Points { pos0: &'a [f64] },
    /// Centers with half-widths.
    Boxes { pos0: &'a [f64], delta0: &'a [f64] },
    /// Four corners per pixel; component 1 is the secondary coordinate.
    Quads { corners: &'a [Corners] },
}

/// Pixel geometry for 2D integration.
#[derive(Debug, Clone, Copy)]
pub enum Pixels2d<'a> {
    Points {
        pos0: &'a [f64],
        pos1: &'a [f64],
    },
    Boxes {
        pos0: &'a [f64],
        delta0: &'a [f64],
        pos1: &'a [f64],
        delta1: &'a [f64],
    },
    Quads {
        corners: &'a [Corners],
    },
}

impl Pixels1d<'_> {
    pub fn len(&self) -> usize {
        match self {
            Pixels1d::Points { pos0 } | Pixels1d::Boxes { pos0, .. } => pos0.len(),
            Pixels1d::Quads { corners } => corners.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn method(&self) -> SplitMethod {
        match self {
            Pixels1d::Points { .. } => SplitMethod::NoSplit,
            Pixels1d::Boxes { .. } => SplitMethod::BoundingBox,
            Pixels1d::Quads { .. } => SplitMethod::Full,
        }
    }
}

impl Pixels2d<'_> {
    pub fn len(&self) -> usize {
        match self {
            Pixels2d::Points { pos0, .. } | Pixels2d::Boxes { pos0, .. } => pos0.len(),
            Pixels2d::Quads { corners } => corners.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn method(&self) -> SplitMethod {
        match self {
            Pixels2d::Points { .. } => SplitMethod::NoSplit,
            Pixels2d::Boxes { .. } => SplitMethod::BoundingBox,
            Pixels2d::Quads { .. } => SplitMethod::Full,
        }
    }
}

/// Construction-time options shared by both integrators.
#[derive(Debug, Clone, Default)]
pub struct SetupOptions<'a> {
    /// `true` excludes the pixel from range resolution and from the matrix.
    pub mask: Option<&'a [bool]>,
    /// 1D only: keep pixels whose secondary extent intersects this filter's
    /// range. 2D integration restricts axis 1 through its [`AxisConfig`].
    pub secondary: Option<SecondaryFilter<'a>>,
    pub build: BuildConfig,
}

impl<'a> SetupOptions<'a> {
    pub fn with_mask(mut self, mask: &'a [bool]) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_secondary(mut self, secondary: SecondaryFilter<'a>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_build(mut self, build: BuildConfig) -> Self {
        self.build = build;
        self
    }

    fn validate(&self, pixels: usize) -> Result<()> {
        if let Some(mask) = self.mask {
            check_len("mask", pixels, mask.len())?;
        }
        if let Some(filter) = &self.secondary {
            if let Some(pos1) = filter.pos1 {
                check_len("secondary positions", pixels, pos1.len())?;
            }
            if let Some(delta1) = filter.delta1 {
                check_len("secondary half-widths", pixels, delta1.len())?;
            }
        }
        Ok(())
    }

    #[inline]
    fn masked(&self, pixel: usize) -> bool {
        self.mask.is_some_and(|m| m[pixel])
    }
}

#[inline]
fn box_extent(center: f64, delta: f64) -> (f64, f64) {
    let d = delta.abs();
    (center - d, center + d)
}

#[inline]
fn corner_extent(corners: &Corners, component: usize) -> (f64, f64) {
    corners
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
            (lo.min(c[component]), hi.max(c[component]))
        })
}

// =============================================================================
// 1D
// =============================================================================

/// 1D integrator over a fixed geometry.
#[derive(Debug, Clone)]
pub struct Integrator1d {
    axis: AxisRange,
    method: SplitMethod,
    matrix: SparseStorage,
    mask_checksum: Option<u64>,
}

impl Integrator1d {
    /// Resolve the range and build the sparse matrix for `pixels`.
    pub fn new(pixels: Pixels1d, config: &AxisConfig, setup: &SetupOptions) -> Result<Self> {
        let n = pixels.len();
        setup.validate(n)?;
        if let Pixels1d::Boxes { delta0, .. } = pixels {
            check_len("delta0", n, delta0.len())?;
        }

        let filter = setup.secondary;
        let rejected = |i: usize| filter.is_some_and(|f| f.rejects(i));

        let (axis, matrix) = match pixels {
            Pixels1d::Points { pos0 } => {
                let axis = AxisRange::resolve(0, config, n, |i| {
                    (!setup.masked(i) && !rejected(i)).then(|| (pos0[i], pos0[i]))
                })?;
                let splitter = PointSplit1d { pos0, axis, filter };
                (axis, sparse::build(&splitter, setup.mask, &setup.build)?)
            }
            Pixels1d::Boxes { pos0, delta0 } => {
                let axis = AxisRange::resolve(0, config, n, |i| {
                    (!setup.masked(i) && !rejected(i)).then(|| box_extent(pos0[i], delta0[i]))
                })?;
                let splitter = BoxSplit1d {
                    pos0,
                    delta0,
                    axis,
                    filter,
                };
                (axis, sparse::build(&splitter, setup.mask, &setup.build)?)
            }
            Pixels1d::Quads { corners } => {
                // Quads take their secondary extent from the corners.
                let outside = |c: &Corners| {
                    filter.is_some_and(|f| {
                        let (lo, hi) = corner_extent(c, 1);
                        f.rejects_extent(lo, hi)
                    })
                };
                let axis = AxisRange::resolve(0, config, n, |i| {
                    (!setup.masked(i) && !outside(&corners[i]))
                        .then(|| corner_extent(&corners[i], 0))
                })?;
                let splitter = FullSplit1d {
                    corners,
                    axis,
                    secondary_range: filter.map(|f| f.range),
                };
                (axis, sparse::build(&splitter, setup.mask, &setup.build)?)
            }
        };

        Ok(Self {
            axis,
            method: pixels.method(),
            matrix,
            mask_checksum: mask_checksum(setup.mask),
        })
    }

    /// Reassemble an integrator from previously built parts.
    ///
    /// Returns [`Error::ShapeMismatch`] if the matrix is structurally broken
    /// or its bin count differs from the axes.
    pub fn from_parts(
        axis: AxisRange,
        method: SplitMethod,
        matrix: SparseStorage,
        mask_checksum: Option<u64>,
    ) -> Result<Self> {
        matrix.validate()?;
        if matrix.bin_count() != axis.bins {
            return Err(Error::ShapeMismatch {
                what: "matrix bins",
                expected: axis.bins,
                actual: matrix.bin_count(),
            });
        }
        Ok(Self {
            axis,
            method,
            matrix,
            mask_checksum,
        })
    }

    /// Integrate one frame.
    pub fn integrate(&self, data: &[f32], opts: &IntegrationOptions) -> Result<Integrate1dResult> {
        let n = self.matrix.pixel_count();
        check_len("intensity", n, data.len())?;
        opts.validate(n)?;

        let frame = correct(data, opts);
        let sums = reduce(&self.matrix, &frame, opts);
        Ok(Integrate1dResult::new(self.axis.centers(), sums))
    }

    /// Convert the matrix to compressed rows.
    pub fn into_csr(self) -> Self {
        Self {
            matrix: SparseStorage::Csr(self.matrix.into_csr()),
            ..self
        }
    }

    pub fn axis(&self) -> &AxisRange {
        &self.axis
    }

    pub fn method(&self) -> SplitMethod {
        self.method
    }

    pub fn matrix(&self) -> &SparseStorage {
        &self.matrix
    }

    pub fn pixel_count(&self) -> usize {
        self.matrix.pixel_count()
    }

    pub fn centers(&self) -> Vec<f64> {
        self.axis.centers()
    }

    /// Checksum of the matrix contents.
    pub fn checksum(&self) -> u64 {
        self.matrix.checksum()
    }

    /// Checksum of the mask used at construction, if any.
    pub fn mask_checksum(&self) -> Option<u64> {
        self.mask_checksum
    }
}

// =============================================================================
// 2D
// =============================================================================

/// 2D integrator over a fixed geometry. Bins are row-major `(bins0, bins1)`.
#[derive(Debug, Clone)]
pub struct Integrator2d {
    axes: [AxisRange; 2],
    method: SplitMethod,
    matrix: SparseStorage,
    mask_checksum: Option<u64>,
}

impl Integrator2d {
    /// Resolve both ranges and build the sparse matrix for `pixels`.
    pub fn new(pixels: Pixels2d, configs: &[AxisConfig; 2], setup: &SetupOptions) -> Result<Self> {
        let n = pixels.len();
        setup.validate(n)?;
        match pixels {
            Pixels2d::Points { pos1, .. } => check_len("pos1", n, pos1.len())?,
            Pixels2d::Boxes {
                delta0,
                pos1,
                delta1,
                ..
            } => {
                check_len("delta0", n, delta0.len())?;
                check_len("pos1", n, pos1.len())?;
                check_len("delta1", n, delta1.len())?;
            }
            Pixels2d::Quads { .. } => {}
        }

        let resolve = |axis: usize, extent: &(dyn Fn(usize) -> (f64, f64) + Sync)| {
            AxisRange::resolve(axis, &configs[axis], n, |i| {
                (!setup.masked(i)).then(|| extent(i))
            })
        };

        let (axes, matrix) = match pixels {
            Pixels2d::Points { pos0, pos1 } => {
                let axes = [
                    resolve(0, &|i: usize| (pos0[i], pos0[i]))?,
                    resolve(1, &|i: usize| (pos1[i], pos1[i]))?,
                ];
                let splitter = PointSplit2d { pos0, pos1, axes };
                (axes, sparse::build(&splitter, setup.mask, &setup.build)?)
            }
            Pixels2d::Boxes {
                pos0,
                delta0,
                pos1,
                delta1,
            } => {
                let axes = [
                    resolve(0, &|i: usize| box_extent(pos0[i], delta0[i]))?,
                    resolve(1, &|i: usize| box_extent(pos1[i], delta1[i]))?,
                ];
                let splitter = BoxSplit2d {
                    pos0,
                    delta0,
                    pos1,
                    delta1,
                    axes,
                };
                (axes, sparse::build(&splitter, setup.mask, &setup.build)?)
            }
            Pixels2d::Quads { corners } => {
                let axes = [
                    resolve(0, &|i: usize| corner_extent(&corners[i], 0))?,
                    resolve(1, &|i: usize| corner_extent(&corners[i], 1))?,
                ];
                let splitter = FullSplit2d { corners, axes };
                (axes, sparse::build(&splitter, setup.mask, &setup.build)?)
            }
        };

        Ok(Self {
            axes,
            method: pixels.method(),
            matrix,
            mask_checksum: mask_checksum(setup.mask),
        })
    }

    /// Reassemble an integrator from previously built parts.
    ///
    /// Returns [`Error::ShapeMismatch`] if the matrix is structurally broken
    /// or its bin count differs from the axes.
    pub fn from_parts(
        axes: [AxisRange; 2],
        method: SplitMethod,
        matrix: SparseStorage,
        mask_checksum: Option<u64>,
    ) -> Result<Self> {
        matrix.validate()?;
        let bins = axes[0].bins * axes[1].bins;
        if matrix.bin_count() != bins {
            return Err(Error::ShapeMismatch {
                what: "matrix bins",
                expected: bins,
                actual: matrix.bin_count(),
            });
        }
        Ok(Self {
            axes,
            method,
            matrix,
            mask_checksum,
        })
    }

    /// Integrate one frame.
    pub fn integrate(&self, data: &[f32], opts: &IntegrationOptions) -> Result<Integrate2dResult> {
        let n = self.matrix.pixel_count();
        check_len("intensity", n, data.len())?;
        opts.validate(n)?;

        let frame = correct(data, opts);
        let sums = reduce(&self.matrix, &frame, opts);
        Ok(Integrate2dResult::new(
            self.axes[0].centers(),
            self.axes[1].centers(),
            sums,
        ))
    }

    pub fn into_csr(self) -> Self {
        Self {
            matrix: SparseStorage::Csr(self.matrix.into_csr()),
            ..self
        }
    }

    pub fn axes(&self) -> &[AxisRange; 2] {
        &self.axes
    }

    pub fn method(&self) -> SplitMethod {
        self.method
    }

    pub fn matrix(&self) -> &SparseStorage {
        &self.matrix
    }

    pub fn pixel_count(&self) -> usize {
        self.matrix.pixel_count()
    }

    /// Bin centers of both axes.
    pub fn centers(&self) -> (Vec<f64>, Vec<f64>) {
        (self.axes[0].centers(), self.axes[1].centers())
    }

    pub fn checksum(&self) -> u64 {
        self.matrix.checksum()
    }

    pub fn mask_checksum(&self) -> Option<u64> {
        self.mask_checksum
    }
}
