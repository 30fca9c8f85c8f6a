//! In-memory coverages: CRS-tagged envelopes, rendered pixel planes and the
//! coverage that ties them to a grid.

use std::fmt;
use std::sync::Arc;

use projection::{Crs, CrsTransform};
use raster_common::BoundingBox;
use tracing::debug;

use crate::error::{CoverageError, Result};
use crate::grid::GridGeometry;

/// Samples per edge when pushing an envelope through a CRS transform.
pub const ENVELOPE_DENSIFY_SAMPLES: usize = 21;

/// Axis-aligned box tagged with the CRS its coordinates are in.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    crs: Crs,
    bbox: BoundingBox,
}

impl Envelope {
    pub fn new(crs: Crs, bbox: BoundingBox) -> Self {
        Self { crs, bbox }
    }

    /// Envelope spanning `width` x `height` from the lower-left `(x, y)`.
    ///
    /// Negative extents are normalized so the box is always well-ordered.
    pub fn from_origin(crs: Crs, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_corners(crs, (x, y), (x + width, y + height))
    }

    /// Envelope from two arbitrary corner points.
    pub fn from_corners(crs: Crs, a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            crs,
            bbox: BoundingBox::from_corners(a, b),
        }
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn lower_corner(&self) -> (f64, f64) {
        (self.bbox.min_x, self.bbox.min_y)
    }

    pub fn upper_corner(&self) -> (f64, f64) {
        (self.bbox.max_x, self.bbox.max_y)
    }

    pub fn width(&self) -> f64 {
        self.bbox.width()
    }

    pub fn height(&self) -> f64 {
        self.bbox.height()
    }

    pub fn is_empty(&self) -> bool {
        self.bbox.is_empty()
    }

    /// Overlap with `other`, which is first transformed into this
    /// envelope's CRS when the two differ. `None` when there is no overlap
    /// with positive area.
    pub fn intersection(&self, other: &Envelope) -> Result<Option<Envelope>> {
        let other = other.to_crs(&self.crs)?;
        Ok(self
            .bbox
            .intersection(&other.bbox)
            .filter(|bbox| !bbox.is_empty())
            .map(|bbox| Envelope::new(self.crs.clone(), bbox)))
    }

    /// True when `other` lies inside this envelope (same CRS only).
    pub fn contains(&self, other: &Envelope) -> bool {
        self.crs == other.crs && self.bbox.contains(&other.bbox)
    }

    /// This envelope expressed in `target`.
    pub fn to_crs(&self, target: &Crs) -> Result<Envelope> {
        if &self.crs == target {
            return Ok(Envelope::new(target.clone(), self.bbox));
        }
        let transform = CrsTransform::new(&self.crs, target)?;
        let bbox = transform.transform_bbox(&self.bbox, ENVELOPE_DENSIFY_SAMPLES)?;
        debug!(from = %self.crs, to = %target, "Transformed envelope");
        Ok(Envelope::new(target.clone(), bbox))
    }

    pub fn approx_eq(&self, other: &Envelope, tolerance: f64) -> bool {
        self.crs == other.crs && self.bbox.approx_eq(&other.bbox, tolerance)
    }
}

/// Name given to the zero-based `band` when a format stores none.
pub fn default_band_name(band: usize) -> String {
    format!("band_{}", band + 1)
}

/// Per-band metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleDimension {
    pub name: String,
    pub no_data: Option<f64>,
}

impl SampleDimension {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            no_data: None,
        }
    }

    pub fn with_no_data(mut self, value: f64) -> Self {
        self.no_data = Some(value);
        self
    }

    /// True when `value` is NaN or matches the no-data sentinel.
    pub fn is_no_data(&self, value: f32) -> bool {
        if value.is_nan() {
            return true;
        }
        match self.no_data {
            Some(nd) if nd.is_nan() => false,
            // pixels are stored as f32, so compare at that precision
            Some(nd) => value == nd as f32,
            None => false,
        }
    }

    /// Fill value for pixels with no source data.
    pub fn fill_value(&self) -> f32 {
        self.no_data.map_or(f32::NAN, |nd| nd as f32)
    }
}

/// Band-sequential f32 pixel planes of one image.
///
/// Planes are shared behind an `Arc`: cloning an image never copies pixels,
/// and nothing can mutate them once built.
#[derive(Clone)]
pub struct RenderedImage {
    width: usize,
    height: usize,
    planes: Arc<[Vec<f32>]>,
}

impl RenderedImage {
    /// Build an image, checking every plane holds `width * height` samples.
    pub fn new(width: usize, height: usize, planes: Vec<Vec<f32>>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoverageError::invalid(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }
        if let Some((band, plane)) = planes
            .iter()
            .enumerate()
            .find(|(_, plane)| plane.len() != width * height)
        {
            return Err(CoverageError::invalid(format!(
                "band {band} holds {} samples, expected {}",
                plane.len(),
                width * height
            )));
        }
        Ok(Self {
            width,
            height,
            planes: planes.into(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn band_count(&self) -> usize {
        self.planes.len()
    }

    /// Samples of one band in row-major order.
    pub fn band(&self, band: usize) -> Option<&[f32]> {
        self.planes.get(band).map(Vec::as_slice)
    }

    pub fn bands(&self) -> impl Iterator<Item = &[f32]> {
        self.planes.iter().map(Vec::as_slice)
    }

    pub fn get(&self, col: usize, row: usize, band: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.band(band).map(|plane| plane[row * self.width + col])
    }

    /// Rows `row_off..row_off + height`, columns `col_off..col_off + width`.
    pub fn window(&self, col_off: usize, row_off: usize, width: usize, height: usize) -> Result<Self> {
        if col_off + width > self.width || row_off + height > self.height {
            return Err(CoverageError::invalid(format!(
                "window {width}x{height}+{col_off}+{row_off} exceeds {}x{} image",
                self.width, self.height
            )));
        }
        let planes = self
            .planes
            .iter()
            .map(|plane| {
                (row_off..row_off + height)
                    .flat_map(move |row| {
                        let start = row * self.width + col_off;
                        plane[start..start + width].iter().copied()
                    })
                    .collect()
            })
            .collect();
        Self::new(width, height, planes)
    }
}

impl fmt::Debug for RenderedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bands", &self.planes.len())
            .finish()
    }
}

/// A gridded raster: pixel planes bound to a CRS through a grid geometry.
///
/// Metadata-only coverages (no image) come out of header-only reads; every
/// transform requires the image.
#[derive(Debug, Clone)]
pub struct GridCoverage {
    name: String,
    crs: Crs,
    grid: GridGeometry,
    bands: Vec<SampleDimension>,
    image: Option<RenderedImage>,
}

impl GridCoverage {
    /// Assemble a coverage, checking the image against the grid and bands.
    pub fn new(
        name: impl Into<String>,
        crs: Crs,
        grid: GridGeometry,
        bands: Vec<SampleDimension>,
        image: RenderedImage,
    ) -> Result<Self> {
        if (image.width(), image.height()) != (grid.width, grid.height) {
            return Err(CoverageError::invalid(format!(
                "image is {}x{} but grid is {}x{}",
                image.width(),
                image.height(),
                grid.width,
                grid.height
            )));
        }
        if image.band_count() != bands.len() {
            return Err(CoverageError::invalid(format!(
                "image has {} bands but {} sample dimensions were given",
                image.band_count(),
                bands.len()
            )));
        }
        Ok(Self {
            name: name.into(),
            crs,
            grid,
            bands,
            image: Some(image),
        })
    }

    /// A coverage that describes a raster without holding its pixels.
    pub fn metadata_only(
        name: impl Into<String>,
        crs: Crs,
        grid: GridGeometry,
        bands: Vec<SampleDimension>,
    ) -> Self {
        Self {
            name: name.into(),
            crs,
            grid,
            bands,
            image: None,
        }
    }

    /// Same coverage under a different name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn grid(&self) -> &GridGeometry {
        &self.grid
    }

    pub fn bands(&self) -> &[SampleDimension] {
        &self.bands
    }

    pub fn image(&self) -> Option<&RenderedImage> {
        self.image.as_ref()
    }

    /// The image, or an error naming the coverage.
    pub fn require_image(&self) -> Result<&RenderedImage> {
        self.image.as_ref().ok_or_else(|| {
            CoverageError::invalid(format!("coverage '{}' has no pixel data", self.name))
        })
    }

    pub fn envelope(&self) -> Envelope {
        Envelope::new(self.crs.clone(), self.grid.envelope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mercator() -> Crs {
        Crs::from_epsg(3857).unwrap()
    }

    fn plane_image(width: usize, height: usize) -> RenderedImage {
        let plane = (0..width * height).map(|i| i as f32).collect();
        RenderedImage::new(width, height, vec![plane]).unwrap()
    }

    #[test]
    fn test_envelope_constructors_normalize() {
        let a = Envelope::from_origin(mercator(), 10.0, 20.0, -5.0, 5.0);
        assert_eq!(a.lower_corner(), (5.0, 20.0));
        assert_eq!(a.upper_corner(), (10.0, 25.0));

        let b = Envelope::from_corners(mercator(), (10.0, 25.0), (5.0, 20.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_envelope_intersection() {
        let a = Envelope::from_origin(mercator(), 0.0, 0.0, 10.0, 10.0);
        let b = Envelope::from_origin(mercator(), 5.0, 5.0, 10.0, 10.0);
        let overlap = a.intersection(&b).unwrap().unwrap();
        assert_eq!(*overlap.bbox(), BoundingBox::new(5.0, 5.0, 10.0, 10.0));

        let touching = Envelope::from_origin(mercator(), 10.0, 0.0, 5.0, 5.0);
        assert!(a.intersection(&touching).unwrap().is_none());
        assert!(a.contains(&overlap));
    }

    #[test]
    fn test_envelope_to_other_crs() {
        let wgs84 = Crs::from_epsg(4326).unwrap();
        let degrees = Envelope::from_origin(wgs84.clone(), -10.0, -10.0, 20.0, 20.0);
        let meters = degrees.to_crs(&mercator()).unwrap();
        assert_eq!(meters.crs(), &mercator());
        assert!(meters.bbox().max_x > 1_000_000.0);
        assert!(meters.bbox().min_y < -1_000_000.0);
    }

    #[test]
    fn test_sample_dimension_no_data() {
        let band = SampleDimension::new("b").with_no_data(-9999.0);
        assert!(band.is_no_data(-9999.0));
        assert!(band.is_no_data(f32::NAN));
        assert!(!band.is_no_data(0.0));
        assert_eq!(band.fill_value(), -9999.0);
        assert!(SampleDimension::new("c").fill_value().is_nan());
    }

    #[test]
    fn test_image_rejects_bad_plane() {
        assert!(RenderedImage::new(2, 2, vec![vec![0.0; 3]]).is_err());
        assert!(RenderedImage::new(0, 2, vec![]).is_err());
    }

    #[test]
    fn test_image_window() {
        let image = plane_image(4, 3);
        let window = image.window(1, 1, 2, 2).unwrap();
        assert_eq!(window.band(0).unwrap(), &[5.0, 6.0, 9.0, 10.0]);
        assert_eq!(image.get(3, 2, 0), Some(11.0));
        assert_eq!(image.get(4, 0, 0), None);
        assert_eq!(image.get(0, 0, 1), None);
    }

    #[test]
    fn test_coverage_checks_consistency() {
        let grid = GridGeometry::from_bbox(&BoundingBox::new(0.0, 0.0, 4.0, 3.0), 4, 3).unwrap();
        let bands = vec![SampleDimension::new("band_1")];

        assert!(GridCoverage::new("ok", mercator(), grid, bands.clone(), plane_image(4, 3)).is_ok());
        assert!(GridCoverage::new("dims", mercator(), grid, bands.clone(), plane_image(3, 3)).is_err());
        assert!(GridCoverage::new("bands", mercator(), grid, vec![], plane_image(4, 3)).is_err());

        let header = GridCoverage::metadata_only("header", mercator(), grid, bands);
        assert!(header.require_image().is_err());
    }

    #[test]
    fn test_image_debug_omits_pixels() {
        let image = plane_image(4, 3);
        assert_eq!(
            format!("{image:?}"),
            "RenderedImage { width: 4, height: 3, bands: 1 }"
        );
    }
}
