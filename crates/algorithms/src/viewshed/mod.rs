//! Viewshed analysis
//!
//! Determines which cells of a DEM are visible from observer points.
//!
//! The sweep ([`line_of_sight`]) traces Bresenham rays from the
//! viewpoint to every perimeter cell of the search square; a running
//! maximum sight-line incline along each ray decides visibility. Visible
//! cells are collected into [`SightLists`], an array of 16 bearing-sector
//! buckets, which the cumulative-analysis operations consume.
//!
//! Reference:
//! Franklin, W.R. & Ray, C. (1994). Higher isn't necessarily better:
//! visibility algorithms and experiments. GIS/LIS.
//! Wheatley, D. (1995). Cumulative viewshed analysis: a GIS-based method
//! for investigating intervisibility. Archaeology and GIS.

mod count;
mod cumulative;
mod lists;
mod sweep;

pub use count::count_visible_cells;
pub use cumulative::{cumulative_viewshed, CvaOutput, CvaParams};
pub use lists::{SightLists, SightPoint, SECTORS};
pub use sweep::{line_of_sight, viewshed, SweepParams};
