//! Reprojection, resampling and cropping of rasters.
//!
//! Each operation transforms the coverage behind a [`RasterInfo`] and
//! rebuilds a fresh descriptor from the result.

use coverage_processor::{Envelope, GridGeometry, InterpolationMethod};
use projection::Crs;
use tracing::debug;

use crate::error::Result;
use crate::info::{build_raster_info, RasterInfo};

/// Reproject `raster` into `target` with nearest-neighbour sampling.
pub fn reproject(raster: &RasterInfo, target: &Crs) -> Result<RasterInfo> {
    reproject_with(raster, target, InterpolationMethod::default())
}

/// Reproject `raster` into `target` using `method`.
///
/// CRS pairs whose transform cannot be inverted over the raster extent fail
/// with [`RasterError::Transform`](crate::RasterError::Transform).
pub fn reproject_with(
    raster: &RasterInfo,
    target: &Crs,
    method: InterpolationMethod,
) -> Result<RasterInfo> {
    debug!(source = %raster.crs(), target = %target, method = %method, "Reprojecting raster");
    let coverage = coverage_processor::reproject(raster.coverage(), target, method)?;
    build_raster_info(coverage)
}

/// Resample `raster` onto `grid` with nearest-neighbour sampling.
pub fn resample(raster: &RasterInfo, grid: &GridGeometry) -> Result<RasterInfo> {
    resample_with(raster, grid, InterpolationMethod::default())
}

/// Resample `raster` onto `grid` using `method`. The CRS is unchanged.
pub fn resample_with(
    raster: &RasterInfo,
    grid: &GridGeometry,
    method: InterpolationMethod,
) -> Result<RasterInfo> {
    debug!(
        from_width = raster.width(),
        from_height = raster.height(),
        to_width = grid.width,
        to_height = grid.height,
        method = %method,
        "Resampling raster"
    );
    let coverage = coverage_processor::resample(raster.coverage(), grid, method)?;
    build_raster_info(coverage)
}

/// Restrict `raster` to its overlap with `envelope`.
///
/// The overlap is widened to whole pixels. No overlap at all is
/// [`RasterError::EmptyResult`](crate::RasterError::EmptyResult).
pub fn crop(raster: &RasterInfo, envelope: &Envelope) -> Result<RasterInfo> {
    let coverage = coverage_processor::crop(raster.coverage(), envelope)?;
    build_raster_info(coverage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{make_envelope, matrix_to_raster, RasterError};
    use raster_common::BoundingBox;

    fn raster() -> RasterInfo {
        let matrix: Vec<Vec<f64>> = (0..4)
            .map(|r| (0..4).map(|c| (r * 4 + c) as f64).collect())
            .collect();
        let envelope = make_envelope("EPSG:4326", 10.0, 40.0, 4.0, 4.0).unwrap();
        matrix_to_raster("grid", &matrix, &envelope).unwrap()
    }

    #[test]
    fn test_resample_keeps_crs() {
        let source = raster();
        let grid = GridGeometry::from_bbox(&BoundingBox::new(10.0, 40.0, 14.0, 44.0), 8, 8).unwrap();
        let resampled = resample(&source, &grid).unwrap();
        assert_eq!(resampled.crs(), source.crs());
        assert_eq!((resampled.width(), resampled.height()), (8, 8));
        // top-left source pixel covers the top-left 2x2 block
        assert_eq!(resampled.sample(1, 1, 0), Some(0.0));
        assert_eq!(source.width(), 4);
    }

    #[test]
    fn test_crop_outside_is_empty() {
        let source = raster();
        let far = make_envelope("EPSG:4326", 100.0, 0.0, 1.0, 1.0).unwrap();
        assert!(matches!(crop(&source, &far), Err(RasterError::EmptyResult(_))));
    }

    #[test]
    fn test_crop_sub_region() {
        let source = raster();
        let inner = make_envelope("EPSG:4326", 11.0, 41.0, 2.0, 2.0).unwrap();
        let cropped = crop(&source, &inner).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (2, 2));
        assert_ne!(cropped.envelope(), source.envelope());
        assert_eq!(cropped.sample(0, 0, 0), Some(5.0));
    }
}
