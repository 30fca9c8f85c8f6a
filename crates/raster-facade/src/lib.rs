//! Typed facade over raster files, coordinate reference systems and
//! coverage transforms.
//!
//! Every raster is described by an immutable [`RasterInfo`] built from a
//! decoded coverage. Operations never mutate their input and report failures
//! as a [`RasterError`] whose variant tells the caller what went wrong:
//!
//! - **I/O**: [`read_raster`], [`write_raster`], [`write_raster_with`]
//! - **Transforms**: [`reproject`], [`resample`], [`crop`]
//! - **CRS**: [`decode_crs`], [`parse_crs_wkt`], [`crs_to_code`],
//!   [`crs_to_wkt`], [`register_authority_definitions`]
//! - **Synthesis**: [`make_envelope`], [`matrix_to_raster`]
//! - **Statistics**: [`band_stats`]
//!
//! ```ignore
//! use raster_facade::{band_stats, make_envelope, matrix_to_raster, write_raster};
//!
//! let envelope = make_envelope("EPSG:3857", 0.0, 0.0, 100.0, 100.0)?;
//! let raster = matrix_to_raster("ramp", &[[0.0, 1.0], [2.0, 3.0]], &envelope)?;
//! println!("{:?}", band_stats(&raster, 0)?);
//! write_raster(&raster, "ramp.tif")?;
//! ```

pub mod crs;
pub mod error;
pub mod info;
pub mod io;
pub mod stats;
pub mod synthesis;
pub mod transform;

pub use crs::{crs_to_code, crs_to_wkt, decode_crs, parse_crs_wkt, register_authority_definitions};
pub use error::{RasterError, Result};
pub use info::{build_raster_info, BandDescriptor, RasterInfo};
pub use io::{read_raster, write_raster, write_raster_with};
pub use stats::{band_stats, BandStats};
pub use synthesis::{make_envelope, matrix_to_raster};
pub use transform::{crop, reproject, reproject_with, resample, resample_with};

// Engine types that appear in the facade signatures.
pub use coverage_processor::{
    Envelope, GridCoverage, GridGeometry, InterpolationMethod, TiffCompression, WriteConfig,
};
pub use projection::{Crs, CrsCode, ProjectionInfo};
