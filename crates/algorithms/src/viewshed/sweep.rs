//! Radial line-of-sight sweep

use crate::maybe_rayon::*;
use crate::viewshed::{SightLists, SightPoint};
use ndarray::Array2;
use vantage_core::raster::Raster;
use vantage_core::{Error, Result};

/// Parameters for the line-of-sight sweep
#[derive(Debug, Clone)]
pub struct SweepParams {
    /// Observer height above the viewpoint cell (map units, default 1.75)
    pub observer_elev: f64,
    /// Target height above each candidate cell (map units, default 0.0)
    pub target_elev: f64,
    /// Maximum sight distance in map units (0 = unlimited)
    pub max_dist: f64,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            observer_elev: 1.75,
            target_elev: 0.0,
            max_dist: 0.0,
        }
    }
}

impl SweepParams {
    /// Search radius in cells for the given cell size.
    fn radius_cells(&self, cell_size: f64, rows: usize, cols: usize) -> usize {
        if self.max_dist > 0.0 && cell_size > 0.0 {
            ((self.max_dist / cell_size).ceil() as usize).max(1)
        } else {
            rows.max(cols)
        }
    }
}

/// Sweep the DEM around a viewpoint, collecting every visible cell into
/// per-direction sight lists.
///
/// Rays run from the viewpoint to each cell on the perimeter of the
/// search square; along a ray, a cell is visible when its sight-line
/// incline reaches the running maximum. Rays are traced in parallel and
/// merged through a visited mask, so each visible cell enters the lists
/// exactly once. The viewpoint cell itself is never inserted.
pub fn line_of_sight(
    dem: &Raster<f64>,
    row_viewpt: usize,
    col_viewpt: usize,
    params: &SweepParams,
) -> Result<SightLists> {
    let (rows, cols) = dem.shape();

    if row_viewpt >= rows || col_viewpt >= cols {
        return Err(Error::IndexOutOfBounds {
            row: row_viewpt,
            col: col_viewpt,
            rows,
            cols,
        });
    }

    let cell_size = dem.cell_size();
    let obs_z = unsafe { dem.get_unchecked(row_viewpt, col_viewpt) } + params.observer_elev;

    if obs_z.is_nan() {
        return Err(Error::Algorithm("Viewpoint is on a nodata cell".into()));
    }

    let max_r = params.radius_cells(cell_size, rows, cols) as isize;
    let obs_r = row_viewpt as isize;
    let obs_c = col_viewpt as isize;

    // Perimeter of the search square
    let mut targets: Vec<(isize, isize)> = Vec::new();
    for c in (obs_c - max_r)..=(obs_c + max_r) {
        targets.push((obs_r - max_r, c));
        targets.push((obs_r + max_r, c));
    }
    for r in (obs_r - max_r + 1)..=(obs_r + max_r - 1) {
        targets.push((r, obs_c - max_r));
        targets.push((r, obs_c + max_r));
    }

    let rays: Vec<Vec<SightPoint>> = targets
        .into_par_iter()
        .map(|(tr, tc)| trace_ray(dem, obs_r, obs_c, obs_z, tr, tc, params, cell_size))
        .collect();

    // Merge: adjacent rays revisit cells, the mask keeps the first hit.
    let mut visited = Array2::<bool>::from_elem((rows, cols), false);
    let mut lists = SightLists::new(row_viewpt, col_viewpt);

    for ray in rays {
        for point in ray {
            if !visited[(point.row, point.col)] {
                visited[(point.row, point.col)] = true;
                lists.insert(point);
            }
        }
    }

    Ok(lists)
}

/// Trace one ray from the viewpoint toward a perimeter target,
/// returning the visible cells along it.
#[allow(clippy::too_many_arguments)]
fn trace_ray(
    dem: &Raster<f64>,
    obs_r: isize,
    obs_c: isize,
    obs_z: f64,
    target_r: isize,
    target_c: isize,
    params: &SweepParams,
    cell_size: f64,
) -> Vec<SightPoint> {
    let (rows, cols) = dem.shape();
    let mut visible = Vec::new();
    let mut max_incline = f64::NEG_INFINITY;

    let dr = target_r - obs_r;
    let dc = target_c - obs_c;
    let steps = dr.unsigned_abs().max(dc.unsigned_abs());

    if steps == 0 {
        return visible;
    }

    let step_r = dr as f64 / steps as f64;
    let step_c = dc as f64 / steps as f64;

    for s in 1..=steps {
        let cr = (obs_r as f64 + step_r * s as f64).round() as isize;
        let cc = (obs_c as f64 + step_c * s as f64).round() as isize;

        if cr < 0 || cc < 0 || (cr as usize) >= rows || (cc as usize) >= cols {
            break;
        }

        let row = cr as usize;
        let col = cc as usize;

        let z = unsafe { dem.get_unchecked(row, col) };
        if z.is_nan() {
            break;
        }

        let drow = (cr - obs_r) as f64 * cell_size;
        let dcol = (cc - obs_c) as f64 * cell_size;
        let dist = (drow * drow + dcol * dcol).sqrt();

        if dist < f64::EPSILON {
            continue;
        }
        if params.max_dist > 0.0 && dist > params.max_dist {
            break;
        }

        let incline = (z + params.target_elev - obs_z) / dist;

        if incline >= max_incline {
            visible.push(SightPoint { row, col, incline });
            max_incline = incline;
        }
    }

    visible
}

/// Compute a single-observer binary viewshed.
///
/// Runs the sweep and materializes the sight lists as a raster:
/// 1 = visible, 0 = hidden. The viewpoint cell is always 1.
pub fn viewshed(
    dem: &Raster<f64>,
    row_viewpt: usize,
    col_viewpt: usize,
    params: &SweepParams,
) -> Result<Raster<u8>> {
    let lists = line_of_sight(dem, row_viewpt, col_viewpt, params)?;

    let mut output: Raster<u8> = dem.with_same_meta();
    output.set_nodata(Some(0));
    unsafe { output.set_unchecked(row_viewpt, col_viewpt, 1) };

    for point in lists.iter() {
        unsafe { output.set_unchecked(point.row, point.col, 1) };
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_core::GeoTransform;

    fn flat_dem(size: usize, elevation: f64) -> Raster<f64> {
        let mut dem = Raster::filled(size, size, elevation);
        dem.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));
        dem
    }

    #[test]
    fn flat_terrain_axis_cells_visible() {
        let dem = flat_dem(21, 100.0);
        let result = viewshed(&dem, 10, 10, &SweepParams::default()).unwrap();

        assert_eq!(result.get(10, 10).unwrap(), 1, "viewpoint always visible");
        assert_eq!(result.get(10, 20).unwrap(), 1);
        assert_eq!(result.get(0, 10).unwrap(), 1);
        assert_eq!(result.get(10, 0).unwrap(), 1);
        assert_eq!(result.get(20, 10).unwrap(), 1);
    }

    #[test]
    fn wall_hides_cells_behind_it() {
        let mut dem = flat_dem(21, 0.0);
        for row in 0..21 {
            dem.set(row, 10, 1000.0).unwrap();
        }

        let result = viewshed(&dem, 10, 5, &SweepParams::default()).unwrap();

        assert_eq!(result.get(10, 8).unwrap(), 1, "cell before wall visible");
        assert_eq!(result.get(10, 10).unwrap(), 1, "wall crest visible");
        assert_eq!(result.get(10, 15).unwrap(), 0, "cell behind wall hidden");
    }

    #[test]
    fn sweep_excludes_the_viewpoint_and_never_duplicates() {
        let dem = flat_dem(15, 50.0);
        let lists = line_of_sight(&dem, 7, 7, &SweepParams::default()).unwrap();

        let mut seen = std::collections::HashSet::new();
        for point in lists.iter() {
            assert!((point.row, point.col) != (7, 7), "viewpoint must not be listed");
            assert!(seen.insert((point.row, point.col)), "duplicate visible cell");
        }
        assert_eq!(lists.len(), seen.len());
    }

    #[test]
    fn max_dist_limits_the_sweep() {
        let dem = flat_dem(41, 100.0);
        let params = SweepParams {
            max_dist: 5.0, // cell size is 1.0
            ..Default::default()
        };
        let lists = line_of_sight(&dem, 20, 20, &params).unwrap();

        for point in lists.iter() {
            let dr = point.row as f64 - 20.0;
            let dc = point.col as f64 - 20.0;
            let dist = (dr * dr + dc * dc).sqrt();
            assert!(dist <= 5.0 + 1e-9, "cell at distance {dist} beyond limit");
        }

        let result = viewshed(&dem, 20, 20, &params).unwrap();
        assert_eq!(result.get(20, 25).unwrap(), 1, "on the limit");
        assert_eq!(result.get(20, 26).unwrap(), 0, "beyond the limit");
    }

    #[test]
    fn viewpoint_out_of_bounds_is_an_error() {
        let dem = flat_dem(10, 100.0);
        assert!(viewshed(&dem, 10, 5, &SweepParams::default()).is_err());
    }

    #[test]
    fn viewpoint_on_nodata_is_an_error() {
        let mut dem = flat_dem(10, 100.0);
        dem.set(5, 5, f64::NAN).unwrap();
        assert!(line_of_sight(&dem, 5, 5, &SweepParams::default()).is_err());
    }

    #[test]
    fn rising_slope_toward_observer_stays_visible() {
        // Terrain falls away from the observer: everything along the
        // east axis is visible.
        let mut dem = flat_dem(11, 0.0);
        for row in 0..11 {
            for col in 0..11 {
                dem.set(row, col, -(col as f64)).unwrap();
            }
        }

        let result = viewshed(&dem, 5, 0, &SweepParams::default()).unwrap();
        for col in 1..11 {
            assert_eq!(result.get(5, col).unwrap(), 1, "col {col} should be visible");
        }
    }

    #[test]
    fn incline_is_negative_below_observer() {
        let dem = flat_dem(11, 100.0);
        let params = SweepParams {
            observer_elev: 10.0,
            ..Default::default()
        };
        let lists = line_of_sight(&dem, 5, 5, &params).unwrap();

        for point in lists.iter() {
            assert!(point.incline < 0.0, "flat ground below a raised observer");
        }
    }
}
