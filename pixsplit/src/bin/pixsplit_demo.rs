//! Integrates a synthetic powder-ring frame from a flat detector.
//!
//! Usage: `pixsplit_demo [config.yaml]`

use std::f64::consts::PI;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use pixsplit::{
    AxisConfig, BuildConfig, Corners, Dummy, IntegrationOptions, Integrator1d, Integrator2d,
    Pixels1d, Pixels2d, SetupOptions, SparseMatrix, StorageKind,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    width: usize,
    height: usize,
    /// Pixel pitch in meters.
    pixel_size: f64,
    /// Sample-to-detector distance in meters.
    distance: f64,
    /// Beam center in pixels.
    center: (f64, f64),
    radial_bins: usize,
    azimuthal_bins: usize,
    storage: StorageKind,
    /// Ring positions in degrees 2θ.
    rings: Vec<f64>,
    log_level: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            pixel_size: 100e-6,
            distance: 0.1,
            center: (200.5, 300.5),
            radial_bins: 500,
            azimuthal_bins: 36,
            storage: StorageKind::Csr,
            rings: vec![5.0, 9.0, 14.0, 21.0],
            log_level: "info".to_string(),
        }
    }
}

impl DemoConfig {
    fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }
}

/// Scattering angle 2θ (degrees) and azimuth χ (radians) of detector point `(x, y)`.
fn polar(config: &DemoConfig, x: f64, y: f64) -> [f64; 2] {
    let dx = (x - config.center.0) * config.pixel_size;
    let dy = (y - config.center.1) * config.pixel_size;
    let tth = dx.hypot(dy).atan2(config.distance).to_degrees();
    [tth, dy.atan2(dx)]
}

fn detector_corners(config: &DemoConfig) -> Vec<Corners> {
    let mut corners = Vec::with_capacity(config.width * config.height);
    for row in 0..config.height {
        for col in 0..config.width {
            let (x, y) = (col as f64, row as f64);
            corners.push([
                polar(config, x, y),
                polar(config, x + 1.0, y),
                polar(config, x + 1.0, y + 1.0),
                polar(config, x, y + 1.0),
            ]);
        }
    }
    corners
}

fn synthetic_frame(config: &DemoConfig, corners: &[Corners]) -> Vec<f32> {
    corners
        .iter()
        .map(|c| {
            let tth = c.iter().map(|p| p[0]).sum::<f64>() / 4.0;
            let chi = c[0][1];
            let rings: f64 = config
                .rings
                .iter()
                .map(|&r| 1000.0 * (-(tth - r).powi(2) / (2.0 * 0.05 * 0.05)).exp())
                .sum();
            // Mild azimuthal texture so the 2D map is not flat.
            let texture = 1.0 + 0.3 * (2.0 * chi).cos();
            (10.0 + rings * texture) as f32
        })
        .collect()
}

fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => DemoConfig::load(Path::new(&path))?,
        None => DemoConfig::default(),
    };
    common::log_setup::setup_logging(&config.log_level);

    let corners = detector_corners(&config);
    let mut frame = synthetic_frame(&config, &corners);

    // Mask a one-pixel border and flag a dead pixel with the dummy value.
    let mask: Vec<bool> = (0..corners.len())
        .map(|i| {
            let (row, col) = (i / config.width, i % config.width);
            row == 0 || col == 0 || row + 1 == config.height || col + 1 == config.width
        })
        .collect();
    let dead = config.width * (config.height / 2) + config.width / 2;
    frame[dead] = -1.0;

    let build = BuildConfig {
        storage: config.storage,
        ..Default::default()
    };
    let setup = SetupOptions::default()
        .with_mask(&mask)
        .with_build(build);
    let opts = IntegrationOptions::default().with_dummy(Dummy::new(-1.0));

    let radial = Integrator1d::new(
        Pixels1d::Quads { corners: &corners },
        &AxisConfig::radial(config.radial_bins),
        &setup,
    )
    .context("Failed to build 1D integrator")?;
    let profile = radial.integrate(&frame, &opts)?;

    tracing::info!(
        bins = profile.len(),
        nnz = radial.matrix().nnz(),
        checksum = %format!("{:016x}", radial.checksum()),
        "Radial profile ready"
    );

    let peak = profile
        .merged
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    println!("2θ (deg)    intensity");
    for i in (0..profile.len()).step_by((profile.len() / 20).max(1)) {
        println!("{:8.3}  {:11.3}", profile.centers[i], profile.merged[i]);
    }
    println!("strongest bin at 2θ = {:.3}°", profile.centers[peak]);

    let cake = Integrator2d::new(
        Pixels2d::Quads { corners: &corners },
        &[
            AxisConfig::radial(config.radial_bins / 5),
            AxisConfig::azimuthal(config.azimuthal_bins).with_range(-PI, PI),
        ],
        &setup,
    )
    .context("Failed to build 2D integrator")?;
    let map = cake.integrate(&frame, &opts)?;
    let (bins0, bins1) = map.shape();

    tracing::info!(
        bins0,
        bins1,
        nnz = cake.matrix().nnz(),
        mask_checksum = ?cake.mask_checksum(),
        "Cake ready"
    );

    Ok(())
}
