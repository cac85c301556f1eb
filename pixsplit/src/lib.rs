//! Pixsplit - pixel-splitting integration of detector images.
//!
//! Converts a 2D detector frame into a 1D or 2D profile binned by a geometric
//! coordinate (scattering angle, azimuth, ...), accounting for pixels that
//! straddle several output bins:
//! - Range resolution and coordinate-to-bin mapping, with ±π unwrapping
//! - Point, bounding-box and exact quadrilateral overlap
//! - Sparse overlap matrix (dense table or compressed rows)
//! - Parallel corrected reduction (dark, flat, polarization, solid angle)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pixsplit::{AxisConfig, Integrator1d, IntegrationOptions, Pixels1d, SetupOptions};
//!
//! let pixels = Pixels1d::Boxes { pos0: &tth, delta0: &dtth };
//! let integrator = Integrator1d::new(pixels, &AxisConfig::radial(1000), &SetupOptions::default())?;
//!
//! let result = integrator.integrate(&frame, &IntegrationOptions::default())?;
//! println!("{} bins, checksum {:016x}", result.len(), integrator.checksum());
//! ```

pub mod axis;
pub mod config;
mod engine;
mod error;
pub mod geometry;
pub mod integrate;
pub mod sparse;
pub mod split;

// ============================================================================
// Configuration and errors
// ============================================================================

pub use config::{AxisConfig, BuildConfig, StorageKind};
pub use error::{Error, Result};

// ============================================================================
// Integration
// ============================================================================

pub use axis::AxisRange;
pub use engine::{Integrator1d, Integrator2d, Pixels1d, Pixels2d, SetupOptions};
pub use integrate::{Dummy, Integrate1dResult, Integrate2dResult, IntegrationOptions};
pub use split::full::Corners;
pub use split::{SecondaryFilter, SplitMethod};

// ============================================================================
// Sparse storage
// ============================================================================

pub use sparse::{Csr, Lut, SparseMatrix, SparseStorage, mask_checksum, mask_from_i8};
