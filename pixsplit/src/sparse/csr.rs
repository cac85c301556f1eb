//! Compressed-row storage.

use serde::{Deserialize, Serialize};

use super::{ENTRY_BYTES, Lut, Row, SparseMatrix};
use crate::error::{Error, Result};

/// Row pointers into shared pixel-index and coefficient arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Csr {
    pub(crate) pixels: usize,
    pub(crate) row_ptr: Vec<usize>,
    pub(crate) indices: Vec<u32>,
    pub(crate) coefs: Vec<f32>,
}

impl Csr {
    /// Compact a dense table, dropping zero-coefficient padding.
    pub fn from_lut(lut: &Lut) -> Self {
        let mut row_ptr = Vec::with_capacity(lut.bin_count() + 1);
        let mut indices = Vec::with_capacity(lut.nnz());
        let mut coefs = Vec::with_capacity(lut.nnz());

        row_ptr.push(0);
        for bin in 0..lut.bin_count() {
            for (pixel, coef) in lut.row(bin) {
                indices.push(pixel as u32);
                coefs.push(coef);
            }
            row_ptr.push(indices.len());
        }

        Self {
            pixels: lut.pixel_count(),
            row_ptr,
            indices,
            coefs,
        }
    }

    /// `bins + 1` offsets; bin `b` owns `row_ptr[b]..row_ptr[b + 1]`.
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn coefs(&self) -> &[f32] {
        &self.coefs
    }

    /// Check the structural invariants of a matrix restored from outside.
    ///
    /// Offsets start at 0, never decrease and end at the entry count; both
    /// entry arrays have the same length and every index names a pixel.
    pub fn validate(&self) -> Result<()> {
        let Some(&first) = self.row_ptr.first() else {
            return Err(Error::ShapeMismatch {
                what: "csr row pointers",
                expected: 1,
                actual: 0,
            });
        };
        if first != 0 {
            return Err(Error::ShapeMismatch {
                what: "csr first row offset",
                expected: 0,
                actual: first,
            });
        }
        if let Some(pair) = self.row_ptr.windows(2).find(|pair| pair[1] < pair[0]) {
            return Err(Error::ShapeMismatch {
                what: "csr row offset order",
                expected: pair[0],
                actual: pair[1],
            });
        }
        let last = self.row_ptr[self.row_ptr.len() - 1];
        if last != self.indices.len() {
            return Err(Error::ShapeMismatch {
                what: "csr last row offset",
                expected: self.indices.len(),
                actual: last,
            });
        }
        if self.coefs.len() != self.indices.len() {
            return Err(Error::ShapeMismatch {
                what: "csr coefficients",
                expected: self.indices.len(),
                actual: self.coefs.len(),
            });
        }
        if let Some(&pixel) = self.indices.iter().find(|&&p| p as usize >= self.pixels) {
            return Err(Error::ShapeMismatch {
                what: "csr pixel index",
                expected: self.pixels,
                actual: pixel as usize,
            });
        }
        Ok(())
    }
}

impl SparseMatrix for Csr {
    fn bin_count(&self) -> usize {
        self.row_ptr.len().saturating_sub(1)
    }

    fn pixel_count(&self) -> usize {
        self.pixels
    }

    fn nnz(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    fn row(&self, bin: usize) -> Row<'_> {
        let range = self.row_ptr[bin]..self.row_ptr[bin + 1];
        Row::Compressed(self.indices[range.clone()].iter().zip(self.coefs[range].iter()))
    }

    fn memory_bytes(&self) -> u64 {
        self.indices.len() as u64 * ENTRY_BYTES
            + (self.row_ptr.len() * size_of::<usize>()) as u64
    }
}
