//! Unwrapping of pixels that straddle the ±π discontinuity of an angular axis.
//!
//! A pixel next to the discontinuity can have corners at `+3.1` and `-3.1`
//! radians. Mapped naively it would span almost the whole circle; adding a
//! full turn to its negative corners makes it contiguous again.

use std::f64::consts::{FRAC_PI_2, TAU};

/// True if the corner angles lie on both sides of the ±π discontinuity:
/// at least one corner above π/2 and at least one below -π/2.
#[inline]
pub fn spans_discontinuity(angles: &[f64; 4]) -> bool {
    let high = angles.iter().any(|&a| a > FRAC_PI_2);
    let low = angles.iter().any(|&a| a < -FRAC_PI_2);
    high && low
}

/// Unwrap corner angles in place. Returns true if a full turn was added.
#[inline]
pub fn unwrap_corners(angles: &mut [f64; 4]) -> bool {
    if !spans_discontinuity(angles) {
        return false;
    }
    for a in angles.iter_mut() {
        if *a < 0.0 {
            *a += TAU;
        }
    }
    true
}
