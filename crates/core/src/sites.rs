//! Viewpoint site lists
//!
//! Cumulative viewshed analysis takes its viewpoints either from a
//! plain-text site list (`east|north[|value]` per line) or from the
//! non-zero cells of a pattern raster. Sites live in geographic
//! coordinates and are mapped onto the analysis grid through the DEM's
//! geotransform.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use std::path::Path;

/// A viewpoint in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub east: f64,
    pub north: f64,
    /// Weight added to the cumulative layer per visible cell (default 1).
    pub value: i32,
}

/// A viewpoint mapped onto the raster grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewpoint {
    pub row: usize,
    pub col: usize,
    pub value: i32,
}

/// Parse a site list.
///
/// One site per line, fields separated by `|`: easting, northing and an
/// optional integer value (a leading `#` on the value field is
/// tolerated). Blank lines and lines starting with `#` are skipped.
pub fn parse_sites(text: &str) -> Result<Vec<Site>> {
    let mut sites = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if fields.len() < 2 {
            return Err(Error::InvalidSite {
                line: raw.to_string(),
                reason: "expected 'east|north[|value]'".into(),
            });
        }

        let east: f64 = fields[0].parse().map_err(|_| Error::InvalidSite {
            line: raw.to_string(),
            reason: format!("bad easting '{}'", fields[0]),
        })?;
        let north: f64 = fields[1].parse().map_err(|_| Error::InvalidSite {
            line: raw.to_string(),
            reason: format!("bad northing '{}'", fields[1]),
        })?;

        let value = match fields.get(2) {
            Some(f) if !f.is_empty() => {
                let digits = f.trim_start_matches('#');
                digits.parse().map_err(|_| Error::InvalidSite {
                    line: raw.to_string(),
                    reason: format!("bad value '{}'", f),
                })?
            }
            _ => 1,
        };

        sites.push(Site { east, north, value });
    }

    Ok(sites)
}

/// Read and parse a site list file.
pub fn read_sites<P: AsRef<Path>>(path: P) -> Result<Vec<Site>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_sites(&text)
}

/// Map sites onto a raster grid.
///
/// Returns the in-bounds viewpoints and the number of sites that fell
/// outside the raster.
pub fn map_sites(
    sites: &[Site],
    transform: &GeoTransform,
    rows: usize,
    cols: usize,
) -> (Vec<Viewpoint>, usize) {
    let mut viewpoints = Vec::with_capacity(sites.len());
    let mut skipped = 0;

    for site in sites {
        let (col_f, row_f) = transform.geo_to_pixel(site.east, site.north);
        let col = col_f.floor();
        let row = row_f.floor();

        if row < 0.0 || col < 0.0 || row >= rows as f64 || col >= cols as f64 {
            skipped += 1;
            continue;
        }

        viewpoints.push(Viewpoint {
            row: row as usize,
            col: col as usize,
            value: site.value,
        });
    }

    (viewpoints, skipped)
}

/// Every cell of the pattern raster with a positive value becomes a
/// viewpoint carrying that value.
pub fn viewpoints_from_pattern(pattern: &Raster<i32>) -> Vec<Viewpoint> {
    let (rows, cols) = pattern.shape();
    let mut viewpoints = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            let value = unsafe { pattern.get_unchecked(row, col) };
            if value > 0 && !pattern.is_nodata(value) {
                viewpoints.push(Viewpoint { row, col, value });
            }
        }
    }

    viewpoints
}
