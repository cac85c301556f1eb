//! Shared utilities for the pixsplit workspace: logging setup, deterministic
//! hashing and rayon chunking helpers.

pub mod fnv;
pub mod log_setup;
pub mod parallel;
