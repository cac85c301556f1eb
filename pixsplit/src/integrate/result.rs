use super::BinSums;

/// Output of a 1D integration.
#[derive(Debug, Clone)]
pub struct Integrate1dResult {
    /// Bin-center coordinates.
    pub centers: Vec<f64>,
    pub merged: Vec<f32>,
    pub sum: Vec<f64>,
    pub coverage: Vec<f64>,
    pub sum_variance: Option<Vec<f64>>,
    pub sigma: Option<Vec<f32>>,
}

impl Integrate1dResult {
    pub(crate) fn new(centers: Vec<f64>, sums: BinSums) -> Self {
        Self {
            centers,
            merged: sums.merged,
            sum: sums.sum,
            coverage: sums.coverage,
            sum_variance: sums.sum_variance,
            sigma: sums.sigma,
        }
    }

    pub fn len(&self) -> usize {
        self.merged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }
}

/// Output of a 2D integration. Arrays are row-major `(bins0, bins1)`.
#[derive(Debug, Clone)]
pub struct Integrate2dResult {
    pub centers0: Vec<f64>,
    pub centers1: Vec<f64>,
    pub merged: Vec<f32>,
    pub sum: Vec<f64>,
    pub coverage: Vec<f64>,
    pub sum_variance: Option<Vec<f64>>,
    pub sigma: Option<Vec<f32>>,
}

impl Integrate2dResult {
    pub(crate) fn new(centers0: Vec<f64>, centers1: Vec<f64>, sums: BinSums) -> Self {
        Self {
            centers0,
            centers1,
            merged: sums.merged,
            sum: sums.sum,
            coverage: sums.coverage,
            sum_variance: sums.sum_variance,
            sigma: sums.sigma,
        }
    }

    /// `(bins0, bins1)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.centers0.len(), self.centers1.len())
    }

    #[inline]
    pub fn index(&self, i0: usize, i1: usize) -> usize {
        i0 * self.centers1.len() + i1
    }

    /// Merged value of bin `(i0, i1)`.
    #[inline]
    pub fn get(&self, i0: usize, i1: usize) -> f32 {
        self.merged[self.index(i0, i1)]
    }

    /// One row of the merged profile (fixed `i0`).
    pub fn merged_row(&self, i0: usize) -> &[f32] {
        let n = self.centers1.len();
        &self.merged[i0 * n..(i0 + 1) * n]
    }
}
