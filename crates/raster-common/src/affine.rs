//! Pixel-to-world affine transforms.
//!
//! Layout follows the GDAL geotransform convention:
//!
//! ```text
//! x = origin_x + col * pixel_width  + row * row_rotation
//! y = origin_y + col * col_rotation + row * pixel_height
//! ```
//!
//! For a north-up image `pixel_height` is negative and both rotations are 0.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Affine mapping from (col, row) pixel space to world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

/// The transform has a zero determinant and cannot map world to pixel.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("affine transform is not invertible (determinant {determinant})")]
pub struct NonInvertibleTransform {
    pub determinant: f64,
}

impl AffineTransform {
    /// North-up transform with the given upper-left corner and pixel size.
    ///
    /// `pixel_height` is the (positive) ground size of a row; the stored
    /// coefficient is negated so rows run southwards.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height: -pixel_height,
        }
    }

    /// Transform that stretches a `width` x `height` pixel grid over `bbox`.
    pub fn from_bbox(bbox: &BoundingBox, width: usize, height: usize) -> Self {
        Self::north_up(
            bbox.min_x,
            bbox.max_y,
            bbox.width() / width.max(1) as f64,
            bbox.height() / height.max(1) as f64,
        )
    }

    /// Build from the six GDAL geotransform coefficients.
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self {
            origin_x: gt[0],
            pixel_width: gt[1],
            row_rotation: gt[2],
            origin_y: gt[3],
            col_rotation: gt[4],
            pixel_height: gt[5],
        }
    }

    /// The six GDAL geotransform coefficients.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// No rotation terms.
    pub fn is_axis_aligned(&self) -> bool {
        self.row_rotation == 0.0 && self.col_rotation == 0.0
    }

    pub fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation
    }

    /// Map a (possibly fractional) pixel position to world coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.col_rotation + row * self.pixel_height,
        )
    }

    /// World to pixel mapping.
    pub fn inverse(&self) -> Result<AffineTransform, NonInvertibleTransform> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(NonInvertibleTransform { determinant: det });
        }

        let a = self.pixel_height / det;
        let b = -self.row_rotation / det;
        let d = -self.col_rotation / det;
        let e = self.pixel_width / det;

        Ok(Self {
            origin_x: -(a * self.origin_x + b * self.origin_y),
            pixel_width: a,
            row_rotation: b,
            origin_y: -(d * self.origin_x + e * self.origin_y),
            col_rotation: d,
            pixel_height: e,
        })
    }

    /// World extent covered by a `width` x `height` pixel grid.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let (w, h) = (width as f64, height as f64);
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(w, 0.0),
            self.apply(0.0, h),
            self.apply(w, h),
        ];
        // four corners, never empty
        BoundingBox::from_points(corners).unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Transform of a sub-window starting at pixel (`col_off`, `row_off`).
    pub fn offset(&self, col_off: f64, row_off: f64) -> Self {
        let (origin_x, origin_y) = self.apply(col_off, row_off);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }
}
