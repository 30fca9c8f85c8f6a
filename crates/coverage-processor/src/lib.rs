//! Grid coverage engine for the raster facade.
//!
//! A [`GridCoverage`] bundles a CRS, a [`GridGeometry`], per-band
//! [`SampleDimension`]s and the f32 pixel planes of a [`RenderedImage`].
//! This crate provides the operations over coverages:
//!
//! - **format**: GeoTIFF and ESRI ASCII grid decoding, tiled GeoTIFF
//!   encoding with LZW or Deflate compression
//! - **ops**: reprojection, resampling and cropping
//! - **interpolation**: nearest, bilinear and bicubic kernels
//!
//! Every operation returns a new coverage and leaves its input untouched.

pub mod config;
pub mod coverage;
pub mod error;
pub mod format;
pub mod grid;
pub mod interpolation;
pub mod ops;

pub use config::{InterpolationMethod, TiffCompression, WriteConfig};
pub use coverage::{default_band_name, Envelope, GridCoverage, RenderedImage, SampleDimension};
pub use error::{CoverageError, Result};
pub use format::{detect_format, read_coverage, read_metadata, write_coverage, RasterFormat};
pub use grid::GridGeometry;
pub use ops::{crop, reproject, resample};
