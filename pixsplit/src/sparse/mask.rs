//! Pixel mask helpers. A mask value of `true` excludes the pixel.

use std::hash::Hasher;

use common::fnv::FnvHasher;

/// Convert a byte mask (non-zero = masked) to booleans.
pub fn mask_from_i8(mask: &[i8]) -> Vec<bool> {
    mask.iter().map(|&m| m != 0).collect()
}

/// Checksum of the mask contents, `None` when no mask is in use.
pub fn mask_checksum(mask: Option<&[bool]>) -> Option<u64> {
    mask.map(|mask| {
        let mut hasher = FnvHasher::new();
        hasher.write_u64(mask.len() as u64);
        hasher.write_bools(mask);
        hasher.finish()
    })
}

#[inline]
pub(crate) fn is_masked(mask: Option<&[bool]>, pixel: usize) -> bool {
    mask.is_some_and(|m| m[pixel])
}
