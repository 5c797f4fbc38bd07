//! # Vantage Algorithms
//!
//! Visibility analysis over digital elevation models:
//!
//! - **Line-of-sight sweep**: radial sweep from a viewpoint producing
//!   per-direction lists of visible cells
//! - **Single-observer viewshed**: binary visibility raster
//! - **Cumulative viewshed analysis**: accumulated visibility over many
//!   viewpoints, with per-viewpoint visible-cell counts, running through
//!   segmented raster storage

pub mod maybe_rayon;
pub mod viewshed;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::viewshed::{
        count_visible_cells, cumulative_viewshed, line_of_sight, viewshed, CvaOutput, CvaParams,
        SightLists, SightPoint, SweepParams,
    };
    pub use vantage_core::prelude::*;
}
