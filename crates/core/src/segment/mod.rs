//! Segmented raster storage
//!
//! A `SegmentFile<T>` splits a raster into fixed-size pages backed by an
//! anonymous temporary file, keeping only a bounded number of pages in
//! memory. Accumulation layers in cumulative viewshed analysis are
//! written through this store so their memory footprint stays constant
//! regardless of raster size.

mod file;
mod layout;

pub use file::{SegmentFile, DEFAULT_CACHE_PAGES, DEFAULT_PAGE_SIZE};
pub use layout::SegmentLayout;
