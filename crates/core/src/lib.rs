//! # Vantage Core
//!
//! Core types and I/O for the vantage viewshed-analysis toolkit.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced raster grid
//! - `GeoTransform`: affine transformation for georeferencing
//! - `SegmentFile<T>`: file-backed, page-cached raster storage for
//!   accumulation layers that should not be dense in memory
//! - Site lists: viewpoint input for cumulative viewshed analysis
//! - Native GeoTIFF I/O

pub mod error;
pub mod io;
pub mod raster;
pub mod segment;
pub mod sites;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use segment::{SegmentFile, SegmentLayout};
pub use sites::{Site, Viewpoint};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::segment::{SegmentFile, SegmentLayout};
    pub use crate::sites::{Site, Viewpoint};
}
