use rayon::prelude::*;
use tracing::debug;

use crate::config::InterpolationMethod;
use crate::coverage::{GridCoverage, RenderedImage};
use crate::error::{CoverageError, Result};
use crate::grid::GridGeometry;

use super::sample_planes;

/// Resample `coverage` onto `target`, keeping its CRS.
///
/// Each output pixel center is mapped into the source grid and sampled with
/// `method`. Output pixels outside the source footprint get the band's
/// no-data value (NaN when none is declared). A target with an empty or
/// singular grid is [`CoverageError::InvalidCoverage`].
pub fn resample(
    coverage: &GridCoverage,
    target: &GridGeometry,
    method: InterpolationMethod,
) -> Result<GridCoverage> {
    let image = coverage.require_image()?;
    target.validate()?;
    let to_source = coverage
        .grid()
        .transform
        .inverse()
        .map_err(|e| CoverageError::invalid(e.to_string()))?;

    let mut positions = vec![(f64::NAN, f64::NAN); target.pixel_count()];
    positions
        .par_chunks_mut(target.width)
        .enumerate()
        .for_each(|(row, row_positions)| {
            for (col, position) in row_positions.iter_mut().enumerate() {
                let (x, y) = target.pixel_to_world(col as f64 + 0.5, row as f64 + 0.5);
                let (sx, sy) = to_source.apply(x, y);
                *position = (sx - 0.5, sy - 0.5);
            }
        });

    let planes = sample_planes(image, coverage.bands(), &positions, target.width, method);
    let image = RenderedImage::new(target.width, target.height, planes)?;

    debug!(
        name = coverage.name(),
        from = ?(coverage.grid().width, coverage.grid().height),
        to = ?(target.width, target.height),
        method = %method,
        "Resampled coverage"
    );

    GridCoverage::new(
        coverage.name(),
        coverage.crs().clone(),
        *target,
        coverage.bands().to_vec(),
        image,
    )
}
