use projection::{Crs, CrsTransform};
use tracing::{debug, warn};

use crate::config::InterpolationMethod;
use crate::coverage::{GridCoverage, RenderedImage};
use crate::error::{CoverageError, Result};
use crate::grid::GridGeometry;

use super::sample_planes;

/// Samples per edge when projecting the source boundary.
pub const REPROJECT_DENSIFY_SAMPLES: usize = 21;

/// Reproject `coverage` into `target_crs`.
///
/// The output keeps the source pixel dimensions and covers the bounding box
/// of the densified source boundary in the target CRS. Pixels are filled by
/// inverse mapping: each output pixel center is transformed back into the
/// source CRS and sampled with `method`.
///
/// Fails with [`CoverageError::Transform`] when the boundary has no image in
/// the target CRS or when no boundary point survives a forward and inverse
/// round trip.
pub fn reproject(
    coverage: &GridCoverage,
    target_crs: &Crs,
    method: InterpolationMethod,
) -> Result<GridCoverage> {
    let image = coverage.require_image()?;
    if coverage.crs() == target_crs {
        debug!(name = coverage.name(), crs = %target_crs, "Reprojection to the same CRS");
        return Ok(coverage.clone());
    }

    let forward = CrsTransform::new(coverage.crs(), target_crs)?;
    let inverse = forward.inverse();
    let source_grid = coverage.grid();
    let source_bbox = source_grid.envelope();

    check_invertible(&forward, &inverse, source_grid, coverage.crs(), target_crs)?;

    let target_bbox = forward.transform_bbox(&source_bbox, REPROJECT_DENSIFY_SAMPLES)?;
    if !target_bbox.is_valid() || target_bbox.is_empty() {
        return Err(CoverageError::transform(format!(
            "{} maps to a degenerate extent in {target_crs}",
            coverage.crs()
        )));
    }
    let target_grid = GridGeometry::from_bbox(&target_bbox, source_grid.width, source_grid.height)?;

    let to_source = source_grid
        .transform
        .inverse()
        .map_err(|e| CoverageError::invalid(e.to_string()))?;

    // proj handles stay on this thread; only the sampling runs in parallel
    let mut unmapped = 0usize;
    let mut positions = Vec::with_capacity(target_grid.pixel_count());
    for row in 0..target_grid.height {
        for col in 0..target_grid.width {
            let (x, y) = target_grid.pixel_to_world(col as f64 + 0.5, row as f64 + 0.5);
            match inverse.transform(x, y) {
                Ok((sx, sy)) => {
                    let (px, py) = to_source.apply(sx, sy);
                    positions.push((px - 0.5, py - 0.5));
                }
                Err(_) => {
                    unmapped += 1;
                    positions.push((f64::NAN, f64::NAN));
                }
            }
        }
    }

    let planes = sample_planes(image, coverage.bands(), &positions, target_grid.width, method);
    let image = RenderedImage::new(target_grid.width, target_grid.height, planes)?;

    debug!(
        name = coverage.name(),
        from = %coverage.crs(),
        to = %target_crs,
        width = target_grid.width,
        height = target_grid.height,
        unmapped = unmapped,
        "Reprojected coverage"
    );

    GridCoverage::new(
        coverage.name(),
        target_crs.clone(),
        target_grid,
        coverage.bands().to_vec(),
        image,
    )
}

/// Push the densified source boundary forward and back, failing when no
/// point comes home within half a source pixel.
fn check_invertible(
    forward: &CrsTransform,
    inverse: &CrsTransform,
    grid: &GridGeometry,
    source_crs: &Crs,
    target_crs: &Crs,
) -> Result<()> {
    let (res_x, res_y) = grid.resolution();
    let tolerance = 0.5 * res_x.min(res_y);

    let samples = grid.envelope().densify(REPROJECT_DENSIFY_SAMPLES);
    let total = samples.len();
    let survivors = samples
        .into_iter()
        .filter(|&(x, y)| {
            forward
                .transform(x, y)
                .and_then(|(tx, ty)| inverse.transform(tx, ty))
                .map(|(bx, by)| (bx - x).abs() <= tolerance && (by - y).abs() <= tolerance)
                .unwrap_or(false)
        })
        .count();

    if survivors == 0 {
        return Err(CoverageError::transform(format!(
            "no inverse from {target_crs} back to {source_crs} for this extent"
        )));
    }
    if survivors < total {
        warn!(
            from = %source_crs,
            to = %target_crs,
            survivors = survivors,
            total = total,
            "Some boundary points do not round-trip"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::SampleDimension;
    use raster_common::BoundingBox;

    fn wgs84_coverage() -> GridCoverage {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let grid = GridGeometry::from_bbox(&bbox, 10, 10).unwrap();
        let plane = (0..100).map(|i| i as f32).collect();
        let image = RenderedImage::new(10, 10, vec![plane]).unwrap();
        GridCoverage::new(
            "wgs84",
            Crs::from_epsg(4326).unwrap(),
            grid,
            vec![SampleDimension::new("band_1")],
            image,
        )
        .unwrap()
    }

    #[test]
    fn test_same_crs_is_clone() {
        let coverage = wgs84_coverage();
        let result = reproject(&coverage, coverage.crs(), InterpolationMethod::Nearest).unwrap();
        assert_eq!(result.crs(), coverage.crs());
        assert_eq!(result.grid(), coverage.grid());
    }

    #[test]
    fn test_to_web_mercator() {
        let coverage = wgs84_coverage();
        let mercator = Crs::from_epsg(3857).unwrap();
        let result = reproject(&coverage, &mercator, InterpolationMethod::Nearest).unwrap();

        assert_eq!(result.crs(), &mercator);
        assert_eq!((result.grid().width, result.grid().height), (10, 10));

        let envelope = result.grid().envelope();
        assert!(envelope.min_x.abs() < 1e-3);
        assert!((envelope.max_x - 1113194.9079327357).abs() < 1e-3);
        assert!(envelope.max_y > 1_110_000.0);

        // top-left output pixel maps back near the top-left source pixel
        assert_eq!(result.image().unwrap().get(0, 0, 0), Some(0.0));
    }

    #[test]
    fn test_extent_without_inverse_fails() {
        // far outside the Mercator plane: every point lands on the pole
        let bbox = BoundingBox::new(1.0e12, 1.0e12, 1.0e12 + 1000.0, 1.0e12 + 1000.0);
        let grid = GridGeometry::from_bbox(&bbox, 10, 10).unwrap();
        let coverage = GridCoverage::new(
            "offworld",
            Crs::from_epsg(3857).unwrap(),
            grid,
            vec![SampleDimension::new("band_1")],
            RenderedImage::new(10, 10, vec![vec![1.0; 100]]).unwrap(),
        )
        .unwrap();

        let err = reproject(&coverage, &Crs::from_epsg(4326).unwrap(), InterpolationMethod::Nearest)
            .unwrap_err();
        assert!(matches!(err, CoverageError::Transform(_)));
    }
}
