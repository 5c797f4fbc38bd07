//! Per-viewpoint counting and accumulation

use crate::viewshed::SightLists;
use vantage_core::segment::SegmentFile;
use vantage_core::Result;

/// Count the visible cells recorded in the sight lists and fold them
/// into the analysis layers.
///
/// For every point in `sights` (all 16 sectors):
/// - cells whose pattern value is not positive are skipped when a
///   pattern segment is supplied;
/// - `cell_value`, the viewpoint's weight, is added into the cumulative
///   segment at the cell.
///
/// The total number of counted cells is written into the counts segment
/// at `(row_viewpt, col_viewpt)` and also returned. The viewpoint cell
/// itself is never part of the lists, so it is neither counted nor
/// accumulated.
pub fn count_visible_cells(
    cell_value: i32,
    row_viewpt: usize,
    col_viewpt: usize,
    seg_cumulative: &mut SegmentFile<i32>,
    seg_counts: &mut SegmentFile<i32>,
    mut seg_pattern: Option<&mut SegmentFile<i32>>,
    sights: &SightLists,
) -> Result<u64> {
    let mut count: u64 = 0;

    for point in sights.iter() {
        if let Some(pattern) = seg_pattern.as_deref_mut() {
            if pattern.get(point.row, point.col)? <= 0 {
                continue;
            }
        }

        let so_far = seg_cumulative.get(point.row, point.col)?;
        seg_cumulative.put(point.row, point.col, so_far + cell_value)?;
        count += 1;
    }

    seg_counts.put(row_viewpt, col_viewpt, count as i32)?;

    Ok(count)
}
