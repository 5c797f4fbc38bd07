//! Cumulative viewshed analysis

use crate::viewshed::{count_visible_cells, line_of_sight, SweepParams};
use vantage_core::raster::Raster;
use vantage_core::segment::{SegmentFile, DEFAULT_CACHE_PAGES, DEFAULT_PAGE_SIZE};
use vantage_core::sites::Viewpoint;
use vantage_core::{Error, Result};

/// Parameters for cumulative viewshed analysis
#[derive(Debug, Clone)]
pub struct CvaParams {
    /// Line-of-sight sweep parameters shared by all viewpoints
    pub sweep: SweepParams,
    /// Page edge length for the segment stores, in cells
    pub page_size: usize,
    /// Resident pages per segment store
    pub cache_pages: usize,
}

impl Default for CvaParams {
    fn default() -> Self {
        Self {
            sweep: SweepParams::default(),
            page_size: DEFAULT_PAGE_SIZE,
            cache_pages: DEFAULT_CACHE_PAGES,
        }
    }
}

/// Result of a cumulative viewshed analysis
#[derive(Debug)]
pub struct CvaOutput {
    /// Per-cell accumulated visibility: the sum of the weights of the
    /// viewpoints that see the cell
    pub cumulative: Raster<i32>,
    /// Per-viewpoint visible-cell count, written at each viewpoint's cell
    pub counts: Raster<i32>,
    /// Viewpoints skipped because they fell on nodata or outside the DEM
    pub skipped: usize,
}

/// Run cumulative viewshed analysis over a set of viewpoints.
///
/// For every viewpoint the DEM is swept once; the resulting sight lists
/// are folded into two segment-backed layers by
/// [`count_visible_cells`]: the cumulative layer (weight per visible
/// cell) and the counts layer (visible-cell total at the viewpoint).
/// An optional pattern raster restricts which cells count as visibility
/// targets. The finished layers are materialized as rasters carrying
/// the DEM's georeferencing.
pub fn cumulative_viewshed(
    dem: &Raster<f64>,
    viewpoints: &[Viewpoint],
    pattern: Option<&Raster<i32>>,
    params: &CvaParams,
) -> Result<CvaOutput> {
    let (rows, cols) = dem.shape();

    if viewpoints.is_empty() {
        return Err(Error::Algorithm("No viewpoints provided".into()));
    }

    if let Some(patt) = pattern {
        let (pr, pc) = patt.shape();
        if (pr, pc) != (rows, cols) {
            return Err(Error::SizeMismatch {
                er: rows,
                ec: cols,
                ar: pr,
                ac: pc,
            });
        }
    }

    let mut seg_cumulative: SegmentFile<i32> =
        SegmentFile::with_options(rows, cols, params.page_size, params.cache_pages)?;
    let mut seg_counts: SegmentFile<i32> =
        SegmentFile::with_options(rows, cols, params.page_size, params.cache_pages)?;
    let mut seg_pattern: Option<SegmentFile<i32>> = match pattern {
        Some(patt) => Some(SegmentFile::from_raster(
            patt,
            params.page_size,
            params.cache_pages,
        )?),
        None => None,
    };

    let mut skipped = 0;

    for viewpoint in viewpoints {
        if viewpoint.row >= rows || viewpoint.col >= cols {
            skipped += 1;
            continue;
        }
        let z = unsafe { dem.get_unchecked(viewpoint.row, viewpoint.col) };
        if dem.is_nodata(z) {
            skipped += 1;
            continue;
        }

        let sights = line_of_sight(dem, viewpoint.row, viewpoint.col, &params.sweep)?;
        count_visible_cells(
            viewpoint.value,
            viewpoint.row,
            viewpoint.col,
            &mut seg_cumulative,
            &mut seg_counts,
            seg_pattern.as_mut(),
            &sights,
        )?;
    }

    let mut cumulative = seg_cumulative.to_raster()?;
    cumulative.set_transform(*dem.transform());
    let mut counts = seg_counts.to_raster()?;
    counts.set_transform(*dem.transform());

    Ok(CvaOutput {
        cumulative,
        counts,
        skipped,
    })
}
