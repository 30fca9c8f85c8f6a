//! Point transforms between two CRS handles, backed by proj4rs.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use raster_common::BoundingBox;

use crate::crs::Crs;
use crate::error::{CrsError, Result};

/// A reusable transform from one CRS to another.
///
/// Geographic coordinates are taken and returned in degrees; proj4rs works
/// in radians internally.
#[derive(Debug, Clone)]
pub struct CrsTransform {
    source: Proj,
    target: Proj,
    source_geographic: bool,
    target_geographic: bool,
    identity: bool,
}

impl CrsTransform {
    pub fn new(source: &Crs, target: &Crs) -> Result<Self> {
        let source_proj = instantiate(source)?;
        let target_proj = instantiate(target)?;
        Ok(Self {
            source: source_proj,
            target: target_proj,
            source_geographic: source.is_geographic(),
            target_geographic: target.is_geographic(),
            identity: source == target,
        })
    }

    /// True when both ends are the same CRS.
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// The transform running the other way.
    pub fn inverse(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
            source_geographic: self.target_geographic,
            target_geographic: self.source_geographic,
            identity: self.identity,
        }
    }

    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if self.identity {
            return Ok((x, y));
        }
        if !x.is_finite() || !y.is_finite() {
            return Err(CrsError::transform(format!("non-finite input ({x}, {y})")));
        }

        let mut point = if self.source_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        transform(&self.source, &self.target, &mut point)
            .map_err(|e| CrsError::transform(format!("({x}, {y}): {e:?}")))?;

        let (out_x, out_y) = if self.target_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if out_x.is_finite() && out_y.is_finite() {
            Ok((out_x, out_y))
        } else {
            Err(CrsError::transform(format!(
                "({x}, {y}) has no finite image in the target CRS"
            )))
        }
    }

    /// Bounding box of `bbox` in the target CRS.
    ///
    /// The boundary is densified with `samples_per_edge` points per side so
    /// curved edges are covered. Points that fail to transform are skipped;
    /// the call fails only when none survive.
    pub fn transform_bbox(&self, bbox: &BoundingBox, samples_per_edge: usize) -> Result<BoundingBox> {
        if self.identity {
            return Ok(*bbox);
        }
        let projected = bbox
            .densify(samples_per_edge)
            .into_iter()
            .filter_map(|(x, y)| self.transform(x, y).ok());
        BoundingBox::from_points(projected).ok_or_else(|| {
            CrsError::transform(format!(
                "no point of [{}, {}, {}, {}] maps into the target CRS",
                bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
            ))
        })
    }
}

fn instantiate(crs: &Crs) -> Result<Proj> {
    Proj::from_proj_string(&crs.proj4().to_string())
        .map_err(|e| CrsError::parse(format!("{}: {e:?}", crs.name())))
}
