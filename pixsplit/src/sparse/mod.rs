//! Sparse bins x pixels overlap matrix.
//!
//! Two interchangeable backends implement [`SparseMatrix`]:
//!
//! - [`Lut`]: dense per-bin table with a fixed row capacity. Unused slots are
//!   padded with zero-coefficient entries and skipped on iteration.
//! - [`Csr`]: compressed rows. `row_ptr[bin]..row_ptr[bin + 1]` delimits the
//!   bin's entries in the shared `indices` / `coefs` arrays.
//!
//! Both are produced by [`build`] and are immutable afterwards.

pub mod builder;
pub mod csr;
pub mod lut;
pub mod mask;
mod memory;


use std::hash::Hasher;

use common::fnv::FnvHasher;
use serde::{Deserialize, Serialize};

use crate::config::StorageKind;
use crate::error::Result;

pub use builder::build;
pub use csr::Csr;
pub use lut::Lut;
pub use mask::{mask_checksum, mask_from_i8};

/// One `(pixel, coefficient)` entry of a dense table row.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseEntry {
    pub pixel: u32,
    pub coef: f32,
}

/// Size in bytes of one stored entry (index + coefficient).
pub const ENTRY_BYTES: u64 = size_of::<SparseEntry>() as u64;

/// Iterator over the `(pixel, coefficient)` pairs of one bin.
#[derive(Debug, Clone)]
pub enum Row<'a> {
    Padded(std::slice::Iter<'a, SparseEntry>),
    Compressed(std::iter::Zip<std::slice::Iter<'a, u32>, std::slice::Iter<'a, f32>>),
}

impl Iterator for Row<'_> {
    type Item = (usize, f32);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Row::Padded(entries) => entries
                .find(|e| e.coef != 0.0)
                .map(|e| (e.pixel as usize, e.coef)),
            Row::Compressed(pairs) => pairs.next().map(|(&p, &c)| (p as usize, c)),
        }
    }
}

/// Read-only access to a built overlap matrix.
pub trait SparseMatrix: Sync {
    fn bin_count(&self) -> usize;

    fn pixel_count(&self) -> usize;

    /// Number of stored non-zero entries.
    fn nnz(&self) -> usize;

    /// Non-zero entries of `bin`, in ascending pixel order.
    fn row(&self, bin: usize) -> Row<'_>;

    /// Heap bytes held by the matrix buffers.
    fn memory_bytes(&self) -> u64;

    /// Content checksum over bin count, pixel count and every non-zero
    /// `(bin, pixel, coefficient)` triple.
    ///
    /// Padding is not hashed, so a [`Lut`] and the [`Csr`] converted from it
    /// share a checksum.
    fn checksum(&self) -> u64 {
        let mut hasher = FnvHasher::new();
        hasher.write_u64(self.bin_count() as u64);
        hasher.write_u64(self.pixel_count() as u64);
        for bin in 0..self.bin_count() {
            for (pixel, coef) in self.row(bin) {
                hasher.write_u32s(&[bin as u32, pixel as u32]);
                hasher.write_f32s(&[coef]);
            }
        }
        hasher.finish()
    }

    /// Sum of coefficients per pixel across all bins.
    fn pixel_coverage(&self) -> Vec<f64> {
        let mut coverage = vec![0.0; self.pixel_count()];
        for bin in 0..self.bin_count() {
            for (pixel, coef) in self.row(bin) {
                coverage[pixel] += coef as f64;
            }
        }
        coverage
    }
}

/// A built matrix in either representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SparseStorage {
    Lut(Lut),
    Csr(Csr),
}

impl SparseStorage {
    pub fn kind(&self) -> StorageKind {
        match self {
            SparseStorage::Lut(_) => StorageKind::Lut,
            SparseStorage::Csr(_) => StorageKind::Csr,
        }
    }

    /// Check structural invariants; see [`Lut::validate`] and [`Csr::validate`].
    pub fn validate(&self) -> Result<()> {
        match self {
            SparseStorage::Lut(lut) => lut.validate(),
            SparseStorage::Csr(csr) => csr.validate(),
        }
    }

    /// Compressed form of this matrix; converts a dense table.
    pub fn into_csr(self) -> Csr {
        match self {
            SparseStorage::Lut(lut) => Csr::from_lut(&lut),
            SparseStorage::Csr(csr) => csr,
        }
    }

    fn inner(&self) -> &dyn SparseMatrix {
        match self {
            SparseStorage::Lut(lut) => lut,
            SparseStorage::Csr(csr) => csr,
        }
    }
}

impl SparseMatrix for SparseStorage {
    fn bin_count(&self) -> usize {
        self.inner().bin_count()
    }

    fn pixel_count(&self) -> usize {
        self.inner().pixel_count()
    }

    fn nnz(&self) -> usize {
        self.inner().nnz()
    }

    #[inline]
    fn row(&self, bin: usize) -> Row<'_> {
        self.inner().row(bin)
    }

    fn memory_bytes(&self) -> u64 {
        self.inner().memory_bytes()
    }
}
