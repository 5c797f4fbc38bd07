//! Georeferenced raster grid

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::Array2;

/// A georeferenced 2D raster grid.
///
/// Stores values of type `T` in row-major order together with an affine
/// transform and an optional no-data value.
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a raster filled with zeros.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a raster filled with a specific value.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a raster from a flat row-major vector.
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self {
            data: array,
            transform: GeoTransform::default(),
            nodata: None,
        })
    }

    /// New raster of a different cell type carrying this raster's
    /// georeferencing.
    pub fn with_same_meta<U: RasterElement>(&self) -> Raster<U> {
        Raster {
            data: Array2::zeros(self.data.dim()),
            transform: self.transform,
            nodata: None,
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the raster has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get value at (row, col).
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking.
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col).
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Set value at (row, col) without bounds checking.
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn set_unchecked(&mut self, row: usize, col: usize, value: T) {
        unsafe {
            *self.data.uget_mut((row, col)) = value;
        }
    }

    /// Reference to the underlying array.
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Mutable reference to the underlying array.
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// The geotransform.
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Replace the geotransform.
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// The no-data value.
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Replace the no-data value.
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    /// Cell size (assumes square cells).
    pub fn cell_size(&self) -> f64 {
        self.transform.cell_size()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y).
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Fractional pixel coordinates of a geographic point.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        self.transform.geo_to_pixel(x, y)
    }

    /// Whether a value counts as no-data for this raster.
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Basic statistics over valid cells.
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut min = None;
        let mut max = None;
        let mut sum: f64 = 0.0;
        let mut count: usize = 0;

        for &value in self.data.iter() {
            if self.is_nodata(value) {
                continue;
            }

            match min {
                None => min = Some(value),
                Some(m) if value < m => min = Some(value),
                _ => {}
            }
            match max {
                None => max = Some(value),
                Some(m) if value > m => max = Some(value),
                _ => {}
            }

            if let Some(v) = value.to_f64() {
                sum += v;
                count += 1;
            }
        }

        let mean = if count > 0 {
            Some(sum / count as f64)
        } else {
            None
        };

        RasterStatistics {
            min,
            max,
            mean,
            valid_count: count,
            nodata_count: self.len() - count,
        }
    }
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub nodata_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_and_shape() {
        let raster: Raster<f64> = Raster::new(30, 40);
        assert_eq!(raster.rows(), 30);
        assert_eq!(raster.cols(), 40);
        assert_eq!(raster.shape(), (30, 40));
        assert_eq!(raster.len(), 1200);
        assert!(!raster.is_empty());
    }

    #[test]
    fn get_set_roundtrip() {
        let mut raster: Raster<i32> = Raster::new(10, 10);
        raster.set(4, 7, -3).unwrap();
        assert_eq!(raster.get(4, 7).unwrap(), -3);
        assert!(raster.get(10, 0).is_err());
        assert!(raster.set(0, 10, 1).is_err());
    }

    #[test]
    fn from_vec_rejects_bad_length() {
        assert!(Raster::from_vec(vec![0.0_f64; 9], 2, 5).is_err());
        let r = Raster::from_vec(vec![1.0_f64; 10], 2, 5).unwrap();
        assert_eq!(r.shape(), (2, 5));
    }

    #[test]
    fn with_same_meta_keeps_transform() {
        let mut dem: Raster<f64> = Raster::new(5, 5);
        dem.set_transform(GeoTransform::new(100.0, 200.0, 10.0, -10.0));

        let out: Raster<u8> = dem.with_same_meta();
        assert_eq!(out.shape(), (5, 5));
        assert_eq!(out.transform(), dem.transform());
    }

    #[test]
    fn statistics_skip_nodata() {
        let mut raster: Raster<f64> = Raster::new(3, 3);
        for row in 0..3 {
            for col in 0..3 {
                raster.set(row, col, (row * 3 + col) as f64).unwrap();
            }
        }
        raster.set(1, 1, f64::NAN).unwrap();

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(stats.max, Some(8.0));
        assert_eq!(stats.valid_count, 8);
        assert_eq!(stats.nodata_count, 1);
    }
}
