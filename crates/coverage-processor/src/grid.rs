//! Grid geometry: pixel bounds plus the pixel-to-world mapping.

use raster_common::{AffineTransform, BoundingBox};
use serde::{Deserialize, Serialize};

use crate::error::{CoverageError, Result};

/// Pixel grid tied to world coordinates.
///
/// A grid carries no CRS; its world coordinates are in whatever CRS the
/// owning coverage declares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub transform: AffineTransform,
    pub width: usize,
    pub height: usize,
}

impl GridGeometry {
    /// Create a grid, rejecting empty dimensions and singular transforms.
    pub fn new(transform: AffineTransform, width: usize, height: usize) -> Result<Self> {
        let grid = Self {
            transform,
            width,
            height,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Check a grid built by hand (the fields are public) before using it.
    ///
    /// Dimensions must be positive with a pixel count that fits in `usize`,
    /// and the transform must be invertible.
    pub fn validate(&self) -> Result<()> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return Err(CoverageError::invalid(format!(
                "grid dimensions must be positive, got {width}x{height}"
            )));
        }
        if width.checked_mul(height).is_none() {
            return Err(CoverageError::invalid(format!(
                "grid of {width}x{height} pixels is too large"
            )));
        }
        self.transform
            .inverse()
            .map_err(|e| CoverageError::invalid(e.to_string()))?;
        Ok(())
    }

    /// North-up grid stretching `width` x `height` pixels over `bbox`.
    pub fn from_bbox(bbox: &BoundingBox, width: usize, height: usize) -> Result<Self> {
        if !bbox.is_valid() || bbox.is_empty() {
            return Err(CoverageError::invalid(format!(
                "cannot build a grid over [{}, {}, {}, {}]",
                bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
            )));
        }
        Self::new(AffineTransform::from_bbox(bbox, width, height), width, height)
    }

    /// North-up grid covering `bbox` with square-ish pixels of the given size.
    ///
    /// Dimensions are rounded up so the grid covers the whole box.
    pub fn from_resolution(bbox: &BoundingBox, pixel_width: f64, pixel_height: f64) -> Result<Self> {
        if !(pixel_width > 0.0 && pixel_height > 0.0) {
            return Err(CoverageError::invalid(format!(
                "pixel size must be positive, got {pixel_width}x{pixel_height}"
            )));
        }
        if !bbox.is_valid() || bbox.is_empty() {
            return Err(CoverageError::invalid("cannot build a grid over an empty box"));
        }
        let width = (bbox.width() / pixel_width).ceil().max(1.0) as usize;
        let height = (bbox.height() / pixel_height).ceil().max(1.0) as usize;
        Self::new(
            AffineTransform::north_up(bbox.min_x, bbox.max_y, pixel_width, pixel_height),
            width,
            height,
        )
    }

    /// World coordinates of a (fractional) pixel position. Integer positions
    /// address pixel corners; add 0.5 for centers.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        self.transform.apply(col, row)
    }

    /// Fractional pixel position of a world coordinate.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let inverse = self
            .transform
            .inverse()
            .map_err(|e| CoverageError::invalid(e.to_string()))?;
        Ok(inverse.apply(x, y))
    }

    /// World extent of the grid.
    pub fn envelope(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }

    /// Ground size of one pixel along each axis.
    pub fn resolution(&self) -> (f64, f64) {
        (
            self.transform.pixel_width.hypot(self.transform.col_rotation),
            self.transform.row_rotation.hypot(self.transform.pixel_height),
        )
    }

    pub fn pixel_count(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// Sub-grid of `width` x `height` pixels starting at (`col_off`, `row_off`).
    pub fn window(&self, col_off: usize, row_off: usize, width: usize, height: usize) -> Result<Self> {
        if col_off + width > self.width || row_off + height > self.height {
            return Err(CoverageError::invalid(format!(
                "window {width}x{height}+{col_off}+{row_off} exceeds {}x{} grid",
                self.width, self.height
            )));
        }
        Self::new(
            self.transform.offset(col_off as f64, row_off as f64),
            width,
            height,
        )
    }

    /// Equal within `tolerance` on every transform coefficient, with equal
    /// dimensions.
    pub fn approx_eq(&self, other: &GridGeometry, tolerance: f64) -> bool {
        self.width == other.width
            && self.height == other.height
            && self
                .transform
                .to_gdal()
                .iter()
                .zip(other.transform.to_gdal().iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bbox() {
        let grid = GridGeometry::from_bbox(&BoundingBox::new(0.0, 0.0, 100.0, 50.0), 10, 5).unwrap();
        assert_eq!(grid.resolution(), (10.0, 10.0));
        assert_eq!(grid.pixel_to_world(0.0, 0.0), (0.0, 50.0));
        assert_eq!(grid.pixel_to_world(10.0, 5.0), (100.0, 0.0));
        assert_eq!(grid.envelope(), BoundingBox::new(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_world_to_pixel() {
        let grid = GridGeometry::from_bbox(&BoundingBox::new(0.0, 0.0, 100.0, 50.0), 10, 5).unwrap();
        let (col, row) = grid.world_to_pixel(25.0, 45.0).unwrap();
        assert!((col - 2.5).abs() < 1e-12);
        assert!((row - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_from_resolution_rounds_up() {
        let grid =
            GridGeometry::from_resolution(&BoundingBox::new(0.0, 0.0, 95.0, 41.0), 10.0, 10.0).unwrap();
        assert_eq!((grid.width, grid.height), (10, 5));
        assert!(grid.envelope().contains(&BoundingBox::new(0.0, 0.0, 95.0, 41.0)));
    }

    #[test]
    fn test_window() {
        let grid = GridGeometry::from_bbox(&BoundingBox::new(0.0, 0.0, 100.0, 100.0), 10, 10).unwrap();
        let window = grid.window(2, 3, 4, 5).unwrap();
        assert_eq!(window.envelope(), BoundingBox::new(20.0, 20.0, 60.0, 70.0));
        assert!(grid.window(8, 0, 4, 1).is_err());
    }

    #[test]
    fn test_rejects_degenerate() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(GridGeometry::from_bbox(&bbox, 0, 1).is_err());
        assert!(GridGeometry::from_bbox(&BoundingBox::new(0.0, 0.0, 0.0, 1.0), 1, 1).is_err());
        assert!(GridGeometry::from_resolution(&bbox, 0.0, 1.0).is_err());
        assert!(GridGeometry::new(AffineTransform::north_up(0.0, 1.0, 1.0, 1.0), usize::MAX, 2).is_err());
    }

    #[test]
    fn test_validate_hand_built_grid() {
        let mut grid = GridGeometry::from_bbox(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), 2, 2).unwrap();
        assert!(grid.validate().is_ok());
        grid.height = 0;
        assert!(matches!(grid.validate(), Err(CoverageError::InvalidCoverage(_))));
        assert_eq!(grid.pixel_count(), 0);
    }
}
