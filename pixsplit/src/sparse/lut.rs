//! Dense per-bin table with fixed row capacity.

use serde::{Deserialize, Serialize};

use super::{ENTRY_BYTES, Row, SparseEntry, SparseMatrix};
use crate::error::{Error, Result};

/// Bins x `row_capacity` table of entries, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lut {
    pub(crate) bins: usize,
    pub(crate) pixels: usize,
    pub(crate) row_capacity: usize,
    pub(crate) nnz: usize,
    pub(crate) entries: Vec<SparseEntry>,
}

impl Lut {
    /// Maximum number of pixels contributing to any one bin.
    pub fn row_capacity(&self) -> usize {
        self.row_capacity
    }

    /// The full padded table, `bins * row_capacity` entries.
    pub fn entries(&self) -> &[SparseEntry] {
        &self.entries
    }

    /// Padded slots of `bin`, including zero-coefficient padding.
    pub fn padded_row(&self, bin: usize) -> &[SparseEntry] {
        let start = bin * self.row_capacity;
        &self.entries[start..start + self.row_capacity]
    }

    /// Check the table shape and entry indices of a matrix restored from
    /// outside.
    pub fn validate(&self) -> Result<()> {
        let slots = self.bins.checked_mul(self.row_capacity).unwrap_or(usize::MAX);
        if self.entries.len() != slots {
            return Err(Error::ShapeMismatch {
                what: "lut entries",
                expected: slots,
                actual: self.entries.len(),
            });
        }
        let mut nnz = 0;
        for entry in self.entries.iter().filter(|e| e.coef != 0.0) {
            if entry.pixel as usize >= self.pixels {
                return Err(Error::ShapeMismatch {
                    what: "lut pixel index",
                    expected: self.pixels,
                    actual: entry.pixel as usize,
                });
            }
            nnz += 1;
        }
        if nnz != self.nnz {
            return Err(Error::ShapeMismatch {
                what: "lut non-zero entries",
                expected: nnz,
                actual: self.nnz,
            });
        }
        Ok(())
    }
}

impl SparseMatrix for Lut {
    fn bin_count(&self) -> usize {
        self.bins
    }

    fn pixel_count(&self) -> usize {
        self.pixels
    }

    fn nnz(&self) -> usize {
        self.nnz
    }

    #[inline]
    fn row(&self, bin: usize) -> Row<'_> {
        Row::Padded(self.padded_row(bin).iter())
    }

    fn memory_bytes(&self) -> u64 {
        self.entries.len() as u64 * ENTRY_BYTES
    }
}
