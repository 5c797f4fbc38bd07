//! End-to-end cumulative viewshed analysis on synthetic terrain.
//!
//! Cross-checks the segment-backed CVA pipeline against a plain
//! in-memory reference built from single-observer viewsheds, and runs
//! the results through the GeoTIFF writer/reader.

use vantage_algorithms::viewshed::{cumulative_viewshed, viewshed, CvaParams, SweepParams};
use vantage_core::io::{read_geotiff, write_geotiff};
use vantage_core::raster::Raster;
use vantage_core::sites::Viewpoint;
use vantage_core::GeoTransform;

/// A ridge running north-south through the middle of the raster, with a
/// deterministic rough texture on both flanks.
fn ridge_dem(size: usize) -> Raster<f64> {
    let mut dem = Raster::new(size, size);
    dem.set_transform(GeoTransform::new(0.0, size as f64 * 10.0, 10.0, -10.0));

    let mid = size as f64 / 2.0;
    for row in 0..size {
        for col in 0..size {
            let ridge = 200.0 - (col as f64 - mid).abs() * 8.0;
            let texture = ((row * 13 + col * 7) % 11) as f64 * 0.3;
            dem.set(row, col, ridge.max(0.0) + texture).unwrap();
        }
    }
    dem
}

fn viewpoints() -> Vec<Viewpoint> {
    vec![
        Viewpoint { row: 8, col: 8, value: 1 },
        Viewpoint { row: 8, col: 40, value: 1 },
        Viewpoint { row: 40, col: 8, value: 2 },
        Viewpoint { row: 24, col: 24, value: 1 },
    ]
}

/// Reference: accumulate single-observer viewsheds in memory, excluding
/// each observer's own cell exactly as the counting operation does.
fn reference_cumulative(
    dem: &Raster<f64>,
    viewpoints: &[Viewpoint],
    sweep: &SweepParams,
) -> Raster<i32> {
    let (rows, cols) = dem.shape();
    let mut cumulative: Raster<i32> = Raster::new(rows, cols);

    for vp in viewpoints {
        let vs = viewshed(dem, vp.row, vp.col, sweep).unwrap();
        for row in 0..rows {
            for col in 0..cols {
                if (row, col) == (vp.row, vp.col) {
                    continue;
                }
                if vs.get(row, col).unwrap() > 0 {
                    let so_far = cumulative.get(row, col).unwrap();
                    cumulative.set(row, col, so_far + vp.value).unwrap();
                }
            }
        }
    }
    cumulative
}

#[test]
fn cva_matches_in_memory_reference() {
    let dem = ridge_dem(48);
    let vps = viewpoints();
    let params = CvaParams {
        // Tiny pages and cache so the run actually exercises eviction.
        page_size: 8,
        cache_pages: 3,
        ..Default::default()
    };

    let out = cumulative_viewshed(&dem, &vps, None, &params).unwrap();
    let reference = reference_cumulative(&dem, &vps, &params.sweep);

    assert_eq!(out.skipped, 0);
    for row in 0..48 {
        for col in 0..48 {
            assert_eq!(
                out.cumulative.get(row, col).unwrap(),
                reference.get(row, col).unwrap(),
                "cumulative mismatch at ({row},{col})"
            );
        }
    }
}

#[test]
fn counts_agree_with_single_observer_viewsheds() {
    let dem = ridge_dem(48);
    let vps = viewpoints();
    let params = CvaParams::default();

    let out = cumulative_viewshed(&dem, &vps, None, &params).unwrap();

    for vp in &vps {
        let vs = viewshed(&dem, vp.row, vp.col, &params.sweep).unwrap();
        let mut visible = 0;
        for row in 0..48 {
            for col in 0..48 {
                if vs.get(row, col).unwrap() > 0 {
                    visible += 1;
                }
            }
        }
        // The binary viewshed marks the observer cell; the count does not.
        assert_eq!(
            out.counts.get(vp.row, vp.col).unwrap(),
            visible - 1,
            "count mismatch for viewpoint ({}, {})",
            vp.row,
            vp.col
        );
    }
}

#[test]
fn ridge_blocks_cross_visibility() {
    let dem = ridge_dem(48);
    // Observers low on opposite flanks of the ridge.
    let west = Viewpoint { row: 24, col: 2, value: 1 };
    let east = Viewpoint { row: 24, col: 45, value: 1 };

    let out =
        cumulative_viewshed(&dem, &[west, east], None, &CvaParams::default()).unwrap();

    // Neither observer sees the other through the ridge.
    assert_eq!(out.cumulative.get(24, 45).unwrap(), 0);
    assert_eq!(out.cumulative.get(24, 2).unwrap(), 0);
    // Each sees its own near flank.
    assert_eq!(out.cumulative.get(24, 3).unwrap(), 1);
    assert_eq!(out.cumulative.get(24, 44).unwrap(), 1);
}

#[test]
fn results_roundtrip_through_geotiff() {
    let dem = ridge_dem(32);
    let vps = vec![Viewpoint { row: 16, col: 16, value: 1 }];

    let out = cumulative_viewshed(&dem, &vps, None, &CvaParams::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cumulative.tif");
    write_geotiff(&out.cumulative, &path).unwrap();

    let back: Raster<i32> = read_geotiff(&path).unwrap();
    assert_eq!(back.shape(), out.cumulative.shape());
    for row in 0..32 {
        for col in 0..32 {
            assert_eq!(
                back.get(row, col).unwrap(),
                out.cumulative.get(row, col).unwrap()
            );
        }
    }
}
