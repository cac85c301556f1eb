//! End-to-end properties of matrix construction and integration.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pixsplit::{
    AxisConfig, AxisRange, BuildConfig, Corners, Dummy, Error, IntegrationOptions, Integrator1d,
    Integrator2d, Pixels1d, Pixels2d, SecondaryFilter, SetupOptions, SparseMatrix, SparseStorage,
    SplitMethod,
};

/// `w x h` unit pixels rotated by `theta` and shifted by `offset`.
fn rotated_grid(w: usize, h: usize, theta: f64, offset: (f64, f64)) -> Vec<Corners> {
    let (s, c) = theta.sin_cos();
    let map = |x: f64, y: f64| [offset.0 + c * x - s * y, offset.1 + s * x + c * y];
    let mut corners = Vec::with_capacity(w * h);
    for row in 0..h {
        for col in 0..w {
            let (x, y) = (col as f64, row as f64);
            corners.push([
                map(x, y),
                map(x + 1.0, y),
                map(x + 1.0, y + 1.0),
                map(x, y + 1.0),
            ]);
        }
    }
    corners
}

/// Flat detector seen in polar coordinates `[r, chi]` around `center`.
fn polar_grid(w: usize, h: usize, center: (f64, f64)) -> Vec<Corners> {
    let polar = |x: f64, y: f64| {
        let (dx, dy) = (x - center.0, y - center.1);
        [dx.hypot(dy), dy.atan2(dx)]
    };
    let mut corners = Vec::with_capacity(w * h);
    for row in 0..h {
        for col in 0..w {
            let (x, y) = (col as f64, row as f64);
            corners.push([
                polar(x, y),
                polar(x + 1.0, y),
                polar(x + 1.0, y + 1.0),
                polar(x, y + 1.0),
            ]);
        }
    }
    corners
}

fn random_frame(rng: &mut StdRng, n: usize) -> Vec<f32> {
    (0..n).map(|_| rng.random_range(0.0..100.0)).collect()
}

// =============================================================================
// Partition of unity
// =============================================================================

#[test]
fn test_full_split_1d_partition_of_unity() {
    let corners = rotated_grid(20, 15, 0.3, (5.0, -2.0));
    let integrator = Integrator1d::new(
        Pixels1d::Quads { corners: &corners },
        &AxisConfig::new(37),
        &SetupOptions::default(),
    )
    .unwrap();
    assert_eq!(integrator.method(), SplitMethod::Full);

    for (pixel, c) in integrator.matrix().pixel_coverage().iter().enumerate() {
        assert!((c - 1.0).abs() < 1e-5, "pixel {pixel}: {c}");
    }
}

#[test]
fn test_full_split_2d_partition_of_unity() {
    let corners = rotated_grid(16, 16, 0.45, (0.0, 0.0));
    let integrator = Integrator2d::new(
        Pixels2d::Quads { corners: &corners },
        &[AxisConfig::new(13), AxisConfig::new(11)],
        &SetupOptions::default(),
    )
    .unwrap();

    for (pixel, c) in integrator.matrix().pixel_coverage().iter().enumerate() {
        assert!((c - 1.0).abs() < 1e-5, "pixel {pixel}: {c}");
    }
}

#[test]
fn test_full_split_polar_radial_partition_of_unity() {
    // Center away from the pixels so no pixel contains the origin.
    let corners = polar_grid(24, 24, (-10.5, 40.5));
    let integrator = Integrator1d::new(
        Pixels1d::Quads { corners: &corners },
        &AxisConfig::radial(50),
        &SetupOptions::default(),
    )
    .unwrap();
    for (pixel, c) in integrator.matrix().pixel_coverage().iter().enumerate() {
        assert!((c - 1.0).abs() < 1e-5, "pixel {pixel}: {c}");
    }
}

// =============================================================================
// Conservation
// =============================================================================

#[test]
fn test_weighted_sum_is_conserved() {
    let mut rng = StdRng::seed_from_u64(5);
    let n = 2000;
    let pos0: Vec<f64> = (0..n).map(|_| rng.random_range(0.0..50.0)).collect();
    let delta0: Vec<f64> = (0..n).map(|_| rng.random_range(0.0..2.0)).collect();
    let mut data = random_frame(&mut rng, n);
    let mask: Vec<bool> = (0..n).map(|i| i % 17 == 0).collect();
    for i in (0..n).step_by(23) {
        data[i] = -1.0;
    }
    let flat: Vec<f32> = (0..n).map(|_| rng.random_range(0.5..1.5)).collect();

    let integrator = Integrator1d::new(
        Pixels1d::Boxes {
            pos0: &pos0,
            delta0: &delta0,
        },
        &AxisConfig::new(64),
        &SetupOptions::default().with_mask(&mask),
    )
    .unwrap();

    let opts = IntegrationOptions::default()
        .with_dummy(Dummy::new(-1.0))
        .with_flat(&flat);
    let result = integrator.integrate(&data, &opts).unwrap();

    let coverage = integrator.matrix().pixel_coverage();
    let expected: f64 = (0..n)
        .filter(|&i| !mask[i] && data[i] != -1.0)
        .map(|i| (data[i] / flat[i]) as f64 * coverage[i])
        .sum();
    let total: f64 = result.sum.iter().sum();
    assert!(
        (total - expected).abs() <= 1e-6 * expected.abs(),
        "{total} vs {expected}"
    );
}

// =============================================================================
// Idempotence and storage equivalence
// =============================================================================

#[test]
fn test_checksum_idempotent_across_builds_and_storage() {
    let corners = polar_grid(30, 20, (15.5, -5.5));
    let mask: Vec<bool> = (0..corners.len()).map(|i| i % 7 == 3).collect();
    let build = |storage: BuildConfig| {
        Integrator2d::new(
            Pixels2d::Quads { corners: &corners },
            &[AxisConfig::radial(40), AxisConfig::azimuthal(18)],
            &SetupOptions::default().with_mask(&mask).with_build(storage),
        )
        .unwrap()
    };

    let a = build(BuildConfig::csr());
    let b = build(BuildConfig::csr());
    let lut = build(BuildConfig::lut());
    assert_eq!(a.checksum(), b.checksum());
    assert_eq!(a.checksum(), lut.checksum());
    assert_eq!(a.mask_checksum(), lut.mask_checksum());
    assert!(a.mask_checksum().is_some());

    let converted = lut.into_csr();
    assert!(matches!(converted.matrix(), SparseStorage::Csr(_)));
    assert_eq!(converted.checksum(), a.checksum());
}

#[test]
fn test_lut_and_csr_integrate_identically() {
    let mut rng = StdRng::seed_from_u64(9);
    let corners = rotated_grid(12, 12, 0.2, (0.0, 0.0));
    let data = random_frame(&mut rng, corners.len());
    let configs = [AxisConfig::new(9), AxisConfig::new(7)];

    let lut = Integrator2d::new(
        Pixels2d::Quads { corners: &corners },
        &configs,
        &SetupOptions::default().with_build(BuildConfig::lut()),
    )
    .unwrap();
    let csr = Integrator2d::new(
        Pixels2d::Quads { corners: &corners },
        &configs,
        &SetupOptions::default(),
    )
    .unwrap();

    let opts = IntegrationOptions::default();
    let a = lut.integrate(&data, &opts).unwrap();
    let b = csr.integrate(&data, &opts).unwrap();
    assert_eq!(a.merged, b.merged);
    assert_eq!(a.sum, b.sum);
    assert_eq!(a.coverage, b.coverage);
}

// =============================================================================
// No-split equals direct histogram
// =============================================================================

#[test]
fn test_no_split_matches_direct_histogram() {
    let mut rng = StdRng::seed_from_u64(17);
    let n = 5000;
    let pos0: Vec<f64> = (0..n).map(|_| rng.random_range(-3.0..8.0)).collect();
    let data = random_frame(&mut rng, n);
    let bins = 40;

    let integrator = Integrator1d::new(
        Pixels1d::Points { pos0: &pos0 },
        &AxisConfig::new(bins),
        &SetupOptions::default(),
    )
    .unwrap();
    let result = integrator
        .integrate(&data, &IntegrationOptions::default())
        .unwrap();

    let axis = integrator.axis();
    let mut sum = vec![0.0f64; bins];
    let mut count = vec![0.0f64; bins];
    for i in 0..n {
        let bin = axis.bin_of(pos0[i]).unwrap();
        sum[bin] += data[i] as f64;
        count[bin] += 1.0;
    }

    for bin in 0..bins {
        assert_eq!(result.coverage[bin], count[bin]);
        let expected = if count[bin] > 0.0 {
            (sum[bin] / count[bin]) as f32
        } else {
            0.0
        };
        assert!(
            (result.merged[bin] - expected).abs() <= 1e-5 * expected.abs().max(1.0),
            "bin {bin}: {} vs {expected}",
            result.merged[bin]
        );
    }
}

// =============================================================================
// Wraparound
// =============================================================================

#[test]
fn test_wrapping_pixel_maps_to_contiguous_bins() {
    // Azimuth on component 0; the first pixel straddles ±π.
    let corners: Vec<Corners> = vec![
        [[3.0, 0.0], [3.1, 0.0], [-3.1, 1.0], [-3.0, 1.0]],
        [[-1.0, 0.0], [-0.9, 0.0], [-0.9, 1.0], [-1.0, 1.0]],
    ];
    let integrator = Integrator1d::new(
        Pixels1d::Quads { corners: &corners },
        &AxisConfig::azimuthal(36).with_range(-PI, PI),
        &SetupOptions::default(),
    )
    .unwrap();

    let matrix = integrator.matrix();
    let bins: Vec<usize> = (0..matrix.bin_count())
        .filter(|&b| matrix.row(b).any(|(pixel, _)| pixel == 0))
        .collect();
    assert!(!bins.is_empty());
    assert!(bins.len() <= 3, "{bins:?}");
    assert!(bins.iter().all(|&b| b >= 33), "{bins:?}");
}

// =============================================================================
// Boundary inflation
// =============================================================================

#[test]
fn test_pixel_at_maximum_lands_in_last_bin() {
    let pos0 = [0.0, 1.0, 2.0, 10.0];
    let integrator = Integrator1d::new(
        Pixels1d::Points { pos0: &pos0 },
        &AxisConfig::new(5),
        &SetupOptions::default(),
    )
    .unwrap();
    let last: Vec<usize> = integrator.matrix().row(4).map(|e| e.0).collect();
    assert_eq!(last, vec![3]);
    assert_eq!(integrator.matrix().pixel_coverage()[3], 1.0);
}

// =============================================================================
// Masking
// =============================================================================

#[test]
fn test_masked_pixel_is_absent_and_does_not_shape_range() {
    let pos0 = [1.0, 2.0, 3.0, 100.0];
    let delta0 = [0.5; 4];
    let mask = [false, false, false, true];
    let integrator = Integrator1d::new(
        Pixels1d::Boxes {
            pos0: &pos0,
            delta0: &delta0,
        },
        &AxisConfig::new(6),
        &SetupOptions::default().with_mask(&mask),
    )
    .unwrap();

    assert!(integrator.axis().max < 4.0);
    let matrix = integrator.matrix();
    for bin in 0..matrix.bin_count() {
        assert!(matrix.row(bin).all(|(pixel, _)| pixel != 3));
    }

    // The masked pixel's intensity cannot leak into any bin.
    let with_spike = integrator
        .integrate(&[1.0, 1.0, 1.0, 1e9], &IntegrationOptions::default())
        .unwrap();
    assert!(with_spike.merged.iter().all(|&v| v <= 1.0 + 1e-6));
}

#[test]
fn test_fully_masked_geometry_fails() {
    let pos0 = [1.0, 2.0];
    let mask = [true, true];
    let err = Integrator1d::new(
        Pixels1d::Points { pos0: &pos0 },
        &AxisConfig::new(4),
        &SetupOptions::default().with_mask(&mask),
    )
    .unwrap_err();
    assert!(matches!(err, Error::NoValidPixels));

    // With an explicit range the failure moves to the matrix build.
    let err = Integrator1d::new(
        Pixels1d::Points { pos0: &pos0 },
        &AxisConfig::new(4).with_range(0.0, 3.0),
        &SetupOptions::default().with_mask(&mask),
    )
    .unwrap_err();
    assert!(matches!(err, Error::EmptyMatrix));
}

// =============================================================================
// Empty-bin policy
// =============================================================================

#[test]
fn test_unreached_bin_reports_empty_value() {
    let pos0 = [0.5, 3.5];
    let integrator = Integrator1d::new(
        Pixels1d::Points { pos0: &pos0 },
        &AxisConfig::new(4).with_range(0.0, 4.0),
        &SetupOptions::default(),
    )
    .unwrap();

    let result = integrator
        .integrate(&[2.0, 4.0], &IntegrationOptions::default().with_empty(-7.0))
        .unwrap();
    assert_eq!(result.merged, vec![2.0, -7.0, -7.0, 4.0]);
    assert_eq!(result.sum[1], 0.0);
    assert_eq!(result.coverage[2], 0.0);

    let result = integrator
        .integrate(
            &[2.0, 4.0],
            &IntegrationOptions::default().with_dummy(Dummy::new(-3.0)),
        )
        .unwrap();
    assert_eq!(result.merged[1], -3.0);
}

// =============================================================================
// Secondary filter, persistence and errors
// =============================================================================

#[test]
fn test_secondary_range_restricts_1d_integration() {
    let corners = polar_grid(20, 20, (10.0, 10.0));
    let full = Integrator1d::new(
        Pixels1d::Quads { corners: &corners },
        &AxisConfig::radial(20),
        &SetupOptions::default(),
    )
    .unwrap();
    let half = Integrator1d::new(
        Pixels1d::Quads { corners: &corners },
        &AxisConfig::radial(20),
        &SetupOptions::default().with_secondary(SecondaryFilter::new((0.5, 1.0))),
    )
    .unwrap();
    assert!(half.matrix().nnz() < full.matrix().nnz());

    let coverage = half.matrix().pixel_coverage();
    // Pixel in the lower-left quadrant (chi around -3π/4) is excluded.
    assert_eq!(coverage[2 * 20 + 2], 0.0);
}

#[test]
fn test_secondary_positions_restrict_points() {
    let pos0 = [1.0, 2.0, 3.0];
    let pos1 = [0.0, 10.0, 0.2];
    let integrator = Integrator1d::new(
        Pixels1d::Points { pos0: &pos0 },
        &AxisConfig::new(3),
        &SetupOptions::default().with_secondary(SecondaryFilter::new((-1.0, 1.0)).with_positions(&pos1)),
    )
    .unwrap();
    assert_eq!(integrator.matrix().pixel_coverage(), vec![1.0, 0.0, 1.0]);
}

#[test]
fn test_rebuild_from_serialized_parts() {
    let corners = rotated_grid(8, 8, 0.1, (0.0, 0.0));
    let integrator = Integrator1d::new(
        Pixels1d::Quads { corners: &corners },
        &AxisConfig::new(10),
        &SetupOptions::default(),
    )
    .unwrap();

    let axis_json = serde_json::to_string(integrator.axis()).unwrap();
    let matrix_json = serde_json::to_string(integrator.matrix()).unwrap();
    let axis: AxisRange = serde_json::from_str(&axis_json).unwrap();
    let matrix: SparseStorage = serde_json::from_str(&matrix_json).unwrap();

    let restored = Integrator1d::from_parts(axis, SplitMethod::Full, matrix, None).unwrap();
    assert_eq!(restored.checksum(), integrator.checksum());

    let data = vec![1.0f32; corners.len()];
    let opts = IntegrationOptions::default();
    assert_eq!(
        restored.integrate(&data, &opts).unwrap().merged,
        integrator.integrate(&data, &opts).unwrap().merged
    );

    let wrong = AxisRange { bins: 11, ..axis };
    let err = Integrator1d::from_parts(wrong, SplitMethod::Full, integrator.matrix().clone(), None)
        .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
}

#[test]
fn test_rebuild_rejects_corrupted_matrix() {
    let axis = AxisRange::from_bounds(0, 0.0, 2.0, &AxisConfig::new(2)).unwrap();
    let corrupted = [
        // Row offsets run past the entry arrays.
        r#"{"Csr":{"pixels":2,"row_ptr":[0,5,1],"indices":[0],"coefs":[1.0]}}"#,
        // Entry names a pixel the frame does not have.
        r#"{"Csr":{"pixels":2,"row_ptr":[0,1,1],"indices":[9],"coefs":[1.0]}}"#,
        // Table shorter than bins x row capacity.
        r#"{"Lut":{"bins":2,"pixels":2,"row_capacity":2,"nnz":1,"entries":[{"pixel":0,"coef":1.0}]}}"#,
    ];
    for json in corrupted {
        let matrix: SparseStorage = serde_json::from_str(json).unwrap();
        let err = Integrator1d::from_parts(axis, SplitMethod::NoSplit, matrix, None).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }), "{json}: {err}");
    }

    let matrix: SparseStorage = serde_json::from_str(corrupted[0]).unwrap();
    let err = Integrator2d::from_parts([axis, axis], SplitMethod::NoSplit, matrix, None).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
}

#[test]
fn test_zero_normalization_is_rejected() {
    let pos0 = [0.5, 1.5];
    let integrator = Integrator1d::new(
        Pixels1d::Points { pos0: &pos0 },
        &AxisConfig::new(2),
        &SetupOptions::default(),
    )
    .unwrap();
    let opts = IntegrationOptions::default().with_normalization_factor(0.0);
    let err = integrator.integrate(&[1.0, 2.0], &opts).unwrap_err();
    assert!(matches!(err, Error::InvalidNormalization { .. }));
}

#[test]
fn test_frame_length_checked() {
    let pos0 = [1.0, 2.0];
    let integrator = Integrator1d::new(
        Pixels1d::Points { pos0: &pos0 },
        &AxisConfig::new(2),
        &SetupOptions::default(),
    )
    .unwrap();
    let err = integrator
        .integrate(&[1.0], &IntegrationOptions::default())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::LengthMismatch {
            what: "intensity",
            ..
        }
    ));

    let flat = [1.0; 3];
    let err = integrator
        .integrate(&[1.0, 1.0], &IntegrationOptions::default().with_flat(&flat))
        .unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { what: "flat", .. }));
}

#[test]
fn test_memory_limit_is_enforced() {
    let corners = rotated_grid(10, 10, 0.0, (0.0, 0.0));
    let err = Integrator2d::new(
        Pixels2d::Quads { corners: &corners },
        &[AxisConfig::new(10), AxisConfig::new(10)],
        &SetupOptions::default().with_build(BuildConfig::lut().with_available_memory(64)),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InsufficientMemory { available: 64, .. }));
}

#[test]
fn test_zero_bins_rejected() {
    let pos0 = [1.0, 2.0];
    let pos1 = [1.0, 2.0];
    let err = Integrator2d::new(
        Pixels2d::Points {
            pos0: &pos0,
            pos1: &pos1,
        },
        &[AxisConfig::new(3), AxisConfig::new(0)],
        &SetupOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::ZeroBins { axis: 1 }));
}

#[test]
fn test_2d_cake_of_uniform_frame_is_flat() {
    let corners = polar_grid(40, 40, (20.0, 20.0));
    let integrator = Integrator2d::new(
        Pixels2d::Quads { corners: &corners },
        &[
            AxisConfig::radial(10).with_range(2.0, 18.0),
            AxisConfig::azimuthal(8).with_range(-PI, PI),
        ],
        &SetupOptions::default(),
    )
    .unwrap();
    let data = vec![5.0f32; corners.len()];
    let result = integrator
        .integrate(&data, &IntegrationOptions::default())
        .unwrap();
    assert_eq!(result.shape(), (10, 8));
    for i0 in 0..10 {
        for i1 in 0..8 {
            assert!((result.get(i0, i1) - 5.0).abs() < 1e-4);
        }
    }
}
