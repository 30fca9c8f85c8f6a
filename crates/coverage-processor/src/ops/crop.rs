use tracing::debug;

use crate::coverage::{Envelope, GridCoverage};
use crate::error::{CoverageError, Result};

/// Slack for snapping world coordinates that sit on a pixel edge.
const SNAP_EPSILON: f64 = 1e-6;

/// Restrict `coverage` to its overlap with `envelope`.
///
/// An envelope in another CRS is transformed into the coverage CRS first.
/// The overlap is snapped to whole source pixels (see [`snap_span`]), so
/// pixel values are copied, never resampled. No overlap with positive area
/// is an [`CoverageError::EmptyResult`].
pub fn crop(coverage: &GridCoverage, envelope: &Envelope) -> Result<GridCoverage> {
    let image = coverage.require_image()?;
    let grid = coverage.grid();

    let overlap = coverage.envelope().intersection(envelope)?.ok_or_else(|| {
        CoverageError::empty_result(format!(
            "envelope does not overlap coverage '{}'",
            coverage.name()
        ))
    })?;

    let to_pixel = grid
        .transform
        .inverse()
        .map_err(|e| CoverageError::invalid(e.to_string()))?;
    let bbox = overlap.bbox();
    let corners = [
        to_pixel.apply(bbox.min_x, bbox.min_y),
        to_pixel.apply(bbox.min_x, bbox.max_y),
        to_pixel.apply(bbox.max_x, bbox.min_y),
        to_pixel.apply(bbox.max_x, bbox.max_y),
    ];

    let (mut col_min, mut col_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut row_min, mut row_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for (col, row) in corners {
        col_min = col_min.min(col);
        col_max = col_max.max(col);
        row_min = row_min.min(row);
        row_max = row_max.max(row);
    }
    let (col_start, col_end) = snap_span(col_min, col_max, grid.width);
    let (row_start, row_end) = snap_span(row_min, row_max, grid.height);

    if col_end <= col_start || row_end <= row_start {
        return Err(CoverageError::empty_result(format!(
            "overlap with coverage '{}' is thinner than one pixel",
            coverage.name()
        )));
    }

    let (width, height) = (col_end - col_start, row_end - row_start);
    let window = grid.window(col_start, row_start, width, height)?;
    let pixels = image.window(col_start, row_start, width, height)?;

    debug!(
        name = coverage.name(),
        col_off = col_start,
        row_off = row_start,
        width = width,
        height = height,
        "Cropped coverage"
    );

    GridCoverage::new(
        coverage.name(),
        coverage.crs().clone(),
        window,
        coverage.bands().to_vec(),
        pixels,
    )
}

/// Pixel span `[start, end)` covering `min..max` on an axis of `len` pixels.
///
/// Edges snap outward to whole pixels, except that an edge lying inside the
/// grid never snaps onto the grid's own boundary: it moves inward to the next
/// pixel edge instead, so a window strictly inside the grid always yields a
/// smaller grid. An axis one pixel long keeps the outward span.
fn snap_span(min: f64, max: f64, len: usize) -> (usize, usize) {
    let clamp = |v: f64| v.clamp(0.0, len as f64) as usize;
    let outward = (clamp((min + SNAP_EPSILON).floor()), clamp((max - SNAP_EPSILON).ceil()));

    let mut span = outward;
    if span.0 == 0 && min > SNAP_EPSILON {
        span.0 = clamp((min - SNAP_EPSILON).ceil());
    }
    if span.1 == len && max < len as f64 - SNAP_EPSILON {
        span.1 = clamp((max + SNAP_EPSILON).floor());
    }
    if span.1 <= span.0 {
        outward
    } else {
        span
    }
}
