//! The raster descriptor and the builder that produces it.

use std::fmt;

use coverage_processor::{Envelope, GridCoverage, GridGeometry, RenderedImage, SampleDimension};
use projection::{Crs, ProjectionInfo};
use serde::Serialize;
use tracing::debug;

use crate::error::{RasterError, Result};

/// Per-band summary computed when the descriptor is built.
///
/// `min` and `max` cover valid samples only (not NaN, not no-data). A band
/// without any valid sample reports NaN for both.
#[derive(Debug, Clone, Serialize)]
pub struct BandDescriptor {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub no_data: Option<f64>,
}

impl BandDescriptor {
    fn from_plane(dimension: &SampleDimension, plane: &[f32]) -> Self {
        let (min, max) = plane
            .iter()
            .copied()
            .filter(|&v| !dimension.is_no_data(v))
            .fold(None, |acc: Option<(f32, f32)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            })
            .map_or((f64::NAN, f64::NAN), |(lo, hi)| (lo as f64, hi as f64));

        Self {
            name: dimension.name.clone(),
            min,
            max,
            no_data: dimension.no_data,
        }
    }

    /// True when the band holds at least one valid sample.
    pub fn has_data(&self) -> bool {
        !self.min.is_nan()
    }
}

// NaN statistics of two empty bands compare equal.
impl PartialEq for BandDescriptor {
    fn eq(&self, other: &Self) -> bool {
        fn same(a: f64, b: f64) -> bool {
            a == b || (a.is_nan() && b.is_nan())
        }
        self.name == other.name
            && same(self.min, other.min)
            && same(self.max, other.max)
            && match (self.no_data, other.no_data) {
                (Some(a), Some(b)) => same(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

/// Immutable description of a raster and the coverage behind it.
///
/// Only [`build_raster_info`] creates one, so dimensions, band summaries and
/// the envelope always come from the coverage they describe. Every transform
/// returns a new value. The pixel planes are shared read-only between clones,
/// which makes a `RasterInfo` safe to read from many threads.
#[derive(Clone)]
pub struct RasterInfo {
    coverage: GridCoverage,
    image: RenderedImage,
    crs: Crs,
    projection: Option<ProjectionInfo>,
    envelope: Envelope,
    grid: GridGeometry,
    width: usize,
    height: usize,
    bands: Vec<BandDescriptor>,
}

impl RasterInfo {
    pub fn coverage(&self) -> &GridCoverage {
        &self.coverage
    }

    pub fn image(&self) -> &RenderedImage {
        &self.image
    }

    pub fn name(&self) -> &str {
        self.coverage.name()
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Projection parameters, `None` for geographic systems.
    pub fn projection(&self) -> Option<&ProjectionInfo> {
        self.projection.as_ref()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn grid(&self) -> &GridGeometry {
        &self.grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bands(&self) -> &[BandDescriptor] {
        &self.bands
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Pixel value at `(col, row)` of `band`, `None` outside the raster.
    pub fn sample(&self, col: usize, row: usize, band: usize) -> Option<f32> {
        self.image.get(col, row, band)
    }
}

impl fmt::Debug for RasterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterInfo")
            .field("name", &self.name())
            .field("crs", &self.crs.name())
            .field("envelope", self.envelope.bbox())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bands", &self.bands)
            .finish()
    }
}

/// Describe `coverage`, taking ownership of it.
///
/// Fails with [`RasterError::Descriptor`] when the coverage carries no pixel
/// data or its image disagrees with its grid or band list.
pub fn build_raster_info(coverage: GridCoverage) -> Result<RasterInfo> {
    let image = coverage.image().cloned().ok_or_else(|| {
        RasterError::descriptor(format!("coverage '{}' has no rendered image", coverage.name()))
    })?;

    let grid = *coverage.grid();
    if (image.width(), image.height()) != (grid.width, grid.height) {
        return Err(RasterError::descriptor(format!(
            "image is {}x{} but grid is {}x{}",
            image.width(),
            image.height(),
            grid.width,
            grid.height
        )));
    }
    if image.band_count() != coverage.bands().len() {
        return Err(RasterError::descriptor(format!(
            "image has {} bands, coverage declares {}",
            image.band_count(),
            coverage.bands().len()
        )));
    }

    let bands: Vec<BandDescriptor> = coverage
        .bands()
        .iter()
        .zip(image.bands())
        .map(|(dimension, plane)| BandDescriptor::from_plane(dimension, plane))
        .collect();

    let crs = coverage.crs().clone();
    let projection = crs.projection();
    let envelope = coverage.envelope();

    debug!(
        name = coverage.name(),
        crs = %crs,
        width = image.width(),
        height = image.height(),
        bands = bands.len(),
        "Built raster descriptor"
    );

    Ok(RasterInfo {
        width: image.width(),
        height: image.height(),
        coverage,
        image,
        crs,
        projection,
        envelope,
        grid,
        bands,
    })
}
