//! Common geometry types shared by the raster workspace crates.
//!
//! Everything here is coordinate-system agnostic: a [`BoundingBox`] is four
//! numbers and an [`AffineTransform`] is six. Attaching a CRS is the job of
//! the `projection` and `coverage-processor` crates.

pub mod affine;
pub mod bbox;

pub use affine::{AffineTransform, NonInvertibleTransform};
pub use bbox::{BboxParseError, BoundingBox};
