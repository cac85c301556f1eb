//! Two-pass sparse matrix construction.
//!
//! Pass 1 counts, in parallel, how many pixels land in every bin. The counts
//! size the allocation (row capacity for the dense table, row pointers for
//! CSR), which is checked against available memory before anything is
//! allocated. Pass 2 replays the splitter and writes the entries.
//!
//! Pass 2 runs on one thread and visits pixels in ascending order, so every
//! row lists its pixels in ascending index order and repeated builds are
//! bit-identical.

use std::time::Instant;

use common::parallel::auto_chunk_size;
use rayon::prelude::*;

use crate::config::{BuildConfig, StorageKind};
use crate::error::{Error, Result};
use crate::split::{PixelSplitter, Scratch};

use super::mask::is_masked;
use super::memory::available_memory;
use super::{Csr, ENTRY_BYTES, Lut, SparseEntry, SparseMatrix, SparseStorage};

/// Coefficient as stored, or `None` if it does not survive narrowing to f32.
#[inline]
fn stored_coef(coef: f64) -> Option<f32> {
    let c = coef as f32;
    (c > 0.0).then_some(c)
}

/// Result of the counting pass.
pub(super) struct BinCounts {
    pub(super) counts: Vec<u32>,
    /// Unmasked pixels that reached no bin, whether they lie outside the
    /// range, fail the secondary filter or have no usable area.
    pub(super) dropped: usize,
}

pub(super) fn count_pass<S: PixelSplitter>(splitter: &S, mask: Option<&[bool]>) -> BinCounts {
    let bins = splitter.bin_count();
    let pixels = splitter.pixel_count();

    (0..pixels)
        .into_par_iter()
        .with_min_len(auto_chunk_size(pixels))
        .fold(
            || (vec![0u32; bins], 0usize, Scratch::default()),
            |(mut counts, mut dropped, mut scratch), pixel| {
                if !is_masked(mask, pixel) {
                    let mut hit = false;
                    splitter.split(pixel, &mut scratch, |bin, coef| {
                        if stored_coef(coef).is_some() {
                            counts[bin] += 1;
                            hit = true;
                        }
                    });
                    if !hit {
                        dropped += 1;
                    }
                }
                (counts, dropped, scratch)
            },
        )
        .map(|(counts, dropped, _)| BinCounts { counts, dropped })
        .reduce(
            || BinCounts {
                counts: vec![0; bins],
                dropped: 0,
            },
            |mut a, b| {
                for (x, y) in a.counts.iter_mut().zip(&b.counts) {
                    *x += y;
                }
                a.dropped += b.dropped;
                a
            },
        )
}

/// Projected heap bytes of the matrix, saturating on overflow.
fn projected_bytes(storage: StorageKind, bins: usize, row_capacity: usize, nnz: u64) -> u64 {
    match storage {
        StorageKind::Lut => (bins as u64)
            .saturating_mul(row_capacity as u64)
            .saturating_mul(ENTRY_BYTES),
        StorageKind::Csr => nnz
            .saturating_mul(ENTRY_BYTES)
            .saturating_add(((bins as u64) + 1).saturating_mul(size_of::<usize>() as u64)),
    }
}

fn fill_lut<S: PixelSplitter>(
    splitter: &S,
    mask: Option<&[bool]>,
    row_capacity: usize,
    nnz: usize,
) -> Lut {
    let bins = splitter.bin_count();
    let pixels = splitter.pixel_count();
    let mut entries = vec![SparseEntry::default(); bins * row_capacity];
    let mut fill = vec![0usize; bins];
    let mut scratch = Scratch::default();

    for pixel in 0..pixels {
        if is_masked(mask, pixel) {
            continue;
        }
        splitter.split(pixel, &mut scratch, |bin, coef| {
            if let Some(coef) = stored_coef(coef) {
                entries[bin * row_capacity + fill[bin]] = SparseEntry {
                    pixel: pixel as u32,
                    coef,
                };
                fill[bin] += 1;
            }
        });
    }

    Lut {
        bins,
        pixels,
        row_capacity,
        nnz,
        entries,
    }
}

fn fill_csr<S: PixelSplitter>(splitter: &S, mask: Option<&[bool]>, counts: &[u32]) -> Csr {
    let pixels = splitter.pixel_count();

    let mut row_ptr = Vec::with_capacity(counts.len() + 1);
    row_ptr.push(0usize);
    let mut total = 0usize;
    for &c in counts {
        total += c as usize;
        row_ptr.push(total);
    }

    let mut indices = vec![0u32; total];
    let mut coefs = vec![0f32; total];
    let mut cursor = row_ptr[..counts.len()].to_vec();
    let mut scratch = Scratch::default();

    for pixel in 0..pixels {
        if is_masked(mask, pixel) {
            continue;
        }
        splitter.split(pixel, &mut scratch, |bin, coef| {
            if let Some(coef) = stored_coef(coef) {
                let slot = cursor[bin];
                indices[slot] = pixel as u32;
                coefs[slot] = coef;
                cursor[bin] += 1;
            }
        });
    }

    Csr {
        pixels,
        row_ptr,
        indices,
        coefs,
    }
}

/// Build the overlap matrix for `splitter`, skipping pixels whose mask is set.
///
/// # Errors
///
/// - [`Error::LengthMismatch`] if the mask length differs from the pixel count.
/// - [`Error::TooManyPixels`] if pixel indices do not fit in `u32`.
/// - [`Error::EmptyMatrix`] if there are no bins or no pixel reaches any bin.
/// - [`Error::InsufficientMemory`] if the projected size exceeds available memory.
pub fn build<S: PixelSplitter>(
    splitter: &S,
    mask: Option<&[bool]>,
    config: &BuildConfig,
) -> Result<SparseStorage> {
    let start = Instant::now();
    let bins = splitter.bin_count();
    let pixels = splitter.pixel_count();

    if let Some(mask) = mask {
        crate::error::check_len("mask", pixels, mask.len())?;
    }
    if pixels > u32::MAX as usize {
        return Err(Error::TooManyPixels { count: pixels });
    }
    if bins == 0 {
        return Err(Error::EmptyMatrix);
    }

    let BinCounts { counts, dropped } = count_pass(splitter, mask);
    let row_capacity = counts.iter().copied().max().unwrap_or(0) as usize;
    if row_capacity == 0 {
        return Err(Error::EmptyMatrix);
    }
    let nnz: u64 = counts.iter().map(|&c| c as u64).sum();

    if dropped > 0 {
        tracing::warn!(
            dropped,
            pixels,
            "Unmasked pixels reach no bin"
        );
    }

    let required = projected_bytes(config.storage, bins, row_capacity, nnz);
    let available = available_memory(config.available_memory);
    if required > available {
        return Err(Error::InsufficientMemory {
            required,
            available,
        });
    }

    let storage = match config.storage {
        StorageKind::Lut => {
            SparseStorage::Lut(fill_lut(splitter, mask, row_capacity, nnz as usize))
        }
        StorageKind::Csr => SparseStorage::Csr(fill_csr(splitter, mask, &counts)),
    };

    tracing::info!(
        method = ?S::METHOD,
        storage = ?config.storage,
        bins,
        pixels,
        nnz,
        row_capacity,
        bytes = storage.memory_bytes(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Built sparse matrix"
    );

    Ok(storage)
}
