//! Deterministic FNV-1a hashing for content checksums.
//!
//! `DefaultHasher` is randomly seeded per process, which makes it useless as a
//! cache key that must survive restarts. FNV-1a has a fixed basis.

use std::hash::Hasher;

const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const PRIME: u64 = 0x100000001b3;

/// FNV-1a 64-bit hasher with fixed seed.
#[derive(Debug, Clone)]
pub struct FnvHasher(u64);

impl FnvHasher {
    pub fn new() -> Self {
        Self(OFFSET_BASIS)
    }

    /// Hash a slice of `u32` values in little-endian byte order.
    pub fn write_u32s(&mut self, values: &[u32]) {
        for v in values {
            self.write(&v.to_le_bytes());
        }
    }

    /// Hash a slice of `f32` values by bit pattern, so `-0.0 != 0.0` and NaNs
    /// with different payloads hash differently.
    pub fn write_f32s(&mut self, values: &[f32]) {
        for v in values {
            self.write(&v.to_bits().to_le_bytes());
        }
    }

    /// Hash a slice of booleans as one byte each.
    pub fn write_bools(&mut self, values: &[bool]) {
        for &v in values {
            self.write_u8(v as u8);
        }
    }
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(PRIME);
        }
    }
}
