//! Building envelopes and rasters from plain values.

use coverage_processor::{
    default_band_name, Envelope, GridCoverage, GridGeometry, RenderedImage, SampleDimension,
};
use tracing::debug;

use crate::crs::decode_crs;
use crate::error::{RasterError, Result};
use crate::info::{build_raster_info, RasterInfo};

/// Envelope in the CRS named by `crs_code`, spanning `width` x `height` from
/// the lower-left corner `(x, y)`.
pub fn make_envelope(crs_code: &str, x: f64, y: f64, width: f64, height: f64) -> Result<Envelope> {
    let crs = decode_crs(crs_code)?;
    Ok(Envelope::from_origin(crs, x, y, width, height))
}

/// Single-band raster named `name` whose pixels are `matrix` stretched over
/// `envelope`.
///
/// Row 0 of the matrix is the northern edge. Empty or ragged matrices and
/// envelopes that are not finite with positive area fail with
/// [`RasterError::Shape`].
pub fn matrix_to_raster<R: AsRef<[f64]>>(
    name: &str,
    matrix: &[R],
    envelope: &Envelope,
) -> Result<RasterInfo> {
    let height = matrix.len();
    let width = matrix.first().map_or(0, |row| row.as_ref().len());
    if width == 0 || height == 0 {
        return Err(RasterError::shape(format!("matrix is {height}x{width}")));
    }
    if let Some((index, row)) = matrix
        .iter()
        .enumerate()
        .find(|(_, row)| row.as_ref().len() != width)
    {
        return Err(RasterError::shape(format!(
            "row {index} has {} values, expected {width}",
            row.as_ref().len()
        )));
    }

    let bbox = envelope.bbox();
    if !bbox.is_valid() || bbox.is_empty() {
        return Err(RasterError::shape(format!("envelope {bbox:?} has no area")));
    }
    let grid = GridGeometry::from_bbox(bbox, width, height)
        .map_err(|e| RasterError::shape(e.to_string()))?;

    let plane: Vec<f32> = matrix
        .iter()
        .flat_map(|row| row.as_ref().iter().map(|&v| v as f32))
        .collect();
    let image = RenderedImage::new(width, height, vec![plane])
        .map_err(|e| RasterError::shape(e.to_string()))?;

    let coverage = GridCoverage::new(
        name,
        envelope.crs().clone(),
        grid,
        vec![SampleDimension::new(default_band_name(0))],
        image,
    )
    .map_err(|e| RasterError::descriptor(e.to_string()))?;

    debug!(name = name, width = width, height = height, crs = %envelope.crs(), "Built raster from matrix");
    build_raster_info(coverage)
}
