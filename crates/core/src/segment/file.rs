//! File-backed paged raster store

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::num::NonZeroUsize;

use lru::LruCache;

use super::SegmentLayout;
use crate::error::{Error, Result};
use crate::raster::{Raster, RasterElement};

/// Default page edge length in cells (64x64 cells, 32 KiB per page).
pub const DEFAULT_PAGE_SIZE: usize = 64;

/// Default number of pages held in memory.
pub const DEFAULT_CACHE_PAGES: usize = 64;

const CELL_BYTES: usize = 8;

/// One in-memory page. Cells are held as `f64`, matching the on-disk
/// encoding; values are cast at the `get`/`put` boundary.
struct Page {
    data: Vec<f64>,
    dirty: bool,
}

/// A raster stored as fixed-size pages in an anonymous temporary file,
/// with a bounded LRU cache of resident pages.
///
/// Newly created stores read as all-zero. Dirty pages are written back
/// when evicted and on [`flush`](SegmentFile::flush). Cell values are
/// encoded as little-endian `f64` on disk and cast to `T` on access;
/// values a cast cannot represent come back as `T::default_nodata()`.
pub struct SegmentFile<T: RasterElement> {
    layout: SegmentLayout,
    file: File,
    cache: LruCache<usize, Page>,
    _cell: PhantomData<T>,
}

impl<T: RasterElement> SegmentFile<T> {
    /// Create a zero-filled store with default page and cache sizes.
    pub fn create(rows: usize, cols: usize) -> Result<Self> {
        Self::with_options(rows, cols, DEFAULT_PAGE_SIZE, DEFAULT_CACHE_PAGES)
    }

    /// Create a zero-filled store with explicit page edge length and
    /// cache capacity (in pages).
    pub fn with_options(
        rows: usize,
        cols: usize,
        page_size: usize,
        cache_pages: usize,
    ) -> Result<Self> {
        let layout = SegmentLayout::new(rows, cols, page_size, page_size)?;

        let file = tempfile::tempfile()?;
        // Extending the file makes unwritten pages read as zeros.
        file.set_len((layout.pages() * layout.page_cells() * CELL_BYTES) as u64)?;

        let cap = NonZeroUsize::new(cache_pages.max(1)).unwrap();
        Ok(Self {
            layout,
            file,
            cache: LruCache::new(cap),
            _cell: PhantomData,
        })
    }

    /// Create a store holding a copy of the given raster's values.
    pub fn from_raster(raster: &Raster<T>, page_size: usize, cache_pages: usize) -> Result<Self> {
        let (rows, cols) = raster.shape();
        let mut store = Self::with_options(rows, cols, page_size, cache_pages)?;

        for row in 0..rows {
            for col in 0..cols {
                let value = unsafe { raster.get_unchecked(row, col) };
                store.put(row, col, value)?;
            }
        }
        Ok(store)
    }

    /// Raster rows covered by this store.
    pub fn rows(&self) -> usize {
        self.layout.rows()
    }

    /// Raster columns covered by this store.
    pub fn cols(&self) -> usize {
        self.layout.cols()
    }

    /// The page layout.
    pub fn layout(&self) -> &SegmentLayout {
        &self.layout
    }

    /// Read the value at (row, col).
    pub fn get(&mut self, row: usize, col: usize) -> Result<T> {
        self.check_bounds(row, col)?;
        let (page, offset) = self.layout.locate(row, col);
        let raw = self.page_mut(page)?.data[offset];
        Ok(T::from_f64(raw).unwrap_or(T::default_nodata()))
    }

    /// Write a value at (row, col).
    pub fn put(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        self.check_bounds(row, col)?;
        let (page, offset) = self.layout.locate(row, col);
        let raw = value.to_f64().unwrap_or(f64::NAN);
        let page = self.page_mut(page)?;
        page.data[offset] = raw;
        page.dirty = true;
        Ok(())
    }

    /// Write all dirty resident pages back to the backing file.
    pub fn flush(&mut self) -> Result<()> {
        let file = &mut self.file;
        let layout = &self.layout;
        for (index, page) in self.cache.iter_mut() {
            if page.dirty {
                write_page(file, layout, *index, &page.data)?;
                page.dirty = false;
            }
        }
        Ok(())
    }

    /// Flush and materialize the store's contents as an in-memory raster.
    ///
    /// Segment stores carry no georeferencing; callers reattach a
    /// transform where one applies.
    pub fn to_raster(&mut self) -> Result<Raster<T>> {
        self.flush()?;

        let rows = self.layout.rows();
        let cols = self.layout.cols();
        let page_cols = self.layout.page_cols();
        let mut out = Raster::new(rows, cols);

        for page in 0..self.layout.pages() {
            let data = read_page(&mut self.file, &self.layout, page)?;
            let (row0, col0) = self.layout.page_origin(page);

            for (slot, &raw) in data.iter().enumerate() {
                let row = row0 + slot / page_cols;
                let col = col0 + slot % page_cols;
                if row < rows && col < cols {
                    let value = T::from_f64(raw).unwrap_or(T::default_nodata());
                    unsafe { out.set_unchecked(row, col, value) };
                }
            }
        }

        Ok(out)
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if self.layout.contains(row, col) {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.layout.rows(),
                cols: self.layout.cols(),
            })
        }
    }

    /// Return the resident page, faulting it in (and possibly writing
    /// back an evicted dirty page) if necessary.
    fn page_mut(&mut self, index: usize) -> Result<&mut Page> {
        if self.cache.peek(&index).is_none() {
            let data = read_page(&mut self.file, &self.layout, index)?;
            let loaded = Page { data, dirty: false };

            if let Some((evicted_index, evicted)) = self.cache.push(index, loaded) {
                if evicted.dirty {
                    write_page(&mut self.file, &self.layout, evicted_index, &evicted.data)?;
                }
            }
        }

        self.cache
            .get_mut(&index)
            .ok_or_else(|| Error::Segment("resident page vanished from cache".into()))
    }
}

fn read_page(file: &mut File, layout: &SegmentLayout, page: usize) -> Result<Vec<f64>> {
    let cells = layout.page_cells();
    let mut buf = vec![0u8; cells * CELL_BYTES];

    file.seek(SeekFrom::Start((page * cells * CELL_BYTES) as u64))?;
    file.read_exact(&mut buf)?;

    let mut data = Vec::with_capacity(cells);
    let mut word = [0u8; CELL_BYTES];
    for chunk in buf.chunks_exact(CELL_BYTES) {
        word.copy_from_slice(chunk);
        data.push(f64::from_le_bytes(word));
    }
    Ok(data)
}

fn write_page(file: &mut File, layout: &SegmentLayout, page: usize, data: &[f64]) -> Result<()> {
    let cells = layout.page_cells();
    let mut buf = Vec::with_capacity(cells * CELL_BYTES);
    for value in data {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    file.seek(SeekFrom::Start((page * cells * CELL_BYTES) as u64))?;
    file.write_all(&buf)?;
    Ok(())
}
