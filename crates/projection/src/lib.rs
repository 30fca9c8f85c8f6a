//! Coordinate reference systems for the raster facade.
//!
//! - [`Crs`]: immutable handle carrying WKT and PROJ.4 forms
//! - [`decode_crs`] / [`parse_crs_wkt`]: build handles from codes or WKT
//! - [`crs_to_code`] / [`crs_to_wkt`]: go back the other way
//! - [`register_authority_definitions`]: extend the code space at runtime
//! - [`CrsTransform`]: move points and boxes between systems
//!
//! EPSG definitions come from the bundled `crs-definitions` database and the
//! math is done by `proj4rs`, so no system PROJ install is needed.

pub mod code;
pub mod crs;
pub mod error;
pub mod factory;
pub mod mapping;
pub mod proj4;
pub mod registry;
pub mod transform;
pub mod wkt;

pub use code::CrsCode;
pub use crs::{Crs, CrsKind, ProjectionInfo};
pub use error::{CrsError, Result};
pub use factory::{crs_to_code, crs_to_wkt, decode_crs, parse_crs_wkt};
pub use proj4::Proj4;
pub use registry::{register_authority_definitions, registered_codes};
pub use transform::CrsTransform;
