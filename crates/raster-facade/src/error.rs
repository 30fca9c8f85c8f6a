//! Error taxonomy for facade operations.

use std::path::PathBuf;

use coverage_processor::CoverageError;
use projection::CrsError;
use thiserror::Error;

/// Result type alias using RasterError.
pub type Result<T> = std::result::Result<T, RasterError>;

/// Every failure a facade operation can report.
#[derive(Debug, Error)]
pub enum RasterError {
    // === I/O ===
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to decode raster: {0}")]
    Decode(String),

    #[error("Failed to encode raster: {0}")]
    Encode(String),

    // === CRS ===
    #[error("Unknown CRS code: {0}")]
    CrsLookup(String),

    #[error("Invalid CRS definition: {0}")]
    CrsParse(String),

    // === Transforms ===
    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("Empty result: {0}")]
    EmptyResult(String),

    // === Inputs ===
    #[error("Invalid matrix shape: {0}")]
    Shape(String),

    #[error("Band index {index} out of range for {count} bands")]
    Index { index: usize, count: usize },

    #[error("Invalid coverage: {0}")]
    Descriptor(String),
}

impl RasterError {
    /// Category name, stable across message changes.
    pub fn kind(&self) -> &'static str {
        match self {
            RasterError::NotFound(_) => "NotFound",
            RasterError::Decode(_) => "Decode",
            RasterError::Encode(_) => "Encode",
            RasterError::CrsLookup(_) => "CrsLookup",
            RasterError::CrsParse(_) => "CrsParse",
            RasterError::Transform(_) => "Transform",
            RasterError::EmptyResult(_) => "EmptyResult",
            RasterError::Shape(_) => "Shape",
            RasterError::Index { .. } => "Index",
            RasterError::Descriptor(_) => "Descriptor",
        }
    }

    /// Whether the failure came from the caller's input rather than the data
    /// or the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            RasterError::CrsLookup(_)
                | RasterError::CrsParse(_)
                | RasterError::Shape(_)
                | RasterError::Index { .. }
        )
    }

    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    pub fn descriptor(msg: impl Into<String>) -> Self {
        Self::Descriptor(msg.into())
    }

    /// Map an engine error raised while writing.
    ///
    /// Configuration and filesystem failures on the write path are all
    /// encode failures to the caller.
    pub(crate) fn from_write(err: CoverageError) -> Self {
        match err {
            CoverageError::Encode(msg) => RasterError::Encode(msg),
            other => RasterError::Encode(other.to_string()),
        }
    }
}

impl From<CrsError> for RasterError {
    fn from(err: CrsError) -> Self {
        match err {
            CrsError::Lookup(msg) => RasterError::CrsLookup(msg),
            CrsError::Parse(msg) => RasterError::CrsParse(msg),
            CrsError::Transform(msg) => RasterError::Transform(msg),
            CrsError::DefinitionsNotFound(path) => RasterError::NotFound(path),
            err @ CrsError::Io { .. } => RasterError::Decode(err.to_string()),
        }
    }
}

impl From<CoverageError> for RasterError {
    fn from(err: CoverageError) -> Self {
        match err {
            CoverageError::NotFound(path) => RasterError::NotFound(path),
            err @ CoverageError::Decode { .. } => RasterError::Decode(err.to_string()),
            CoverageError::Encode(msg) => RasterError::Encode(msg),
            CoverageError::Transform(msg) => RasterError::Transform(msg),
            CoverageError::EmptyResult(msg) => RasterError::EmptyResult(msg),
            CoverageError::InvalidCoverage(msg) => RasterError::Descriptor(msg),
            err @ (CoverageError::Config(_) | CoverageError::Io { .. }) => {
                RasterError::Encode(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_errors_keep_category() {
        assert!(matches!(
            RasterError::from(CrsError::lookup("NOPE:1")),
            RasterError::CrsLookup(_)
        ));
        assert!(matches!(
            RasterError::from(CrsError::Parse("x".into())),
            RasterError::CrsParse(_)
        ));
        assert!(matches!(
            RasterError::from(CrsError::Transform("x".into())),
            RasterError::Transform(_)
        ));
        assert!(matches!(
            RasterError::from(CrsError::DefinitionsNotFound("/x".into())),
            RasterError::NotFound(_)
        ));
    }

    #[test]
    fn test_coverage_errors_keep_category() {
        assert!(matches!(
            RasterError::from(CoverageError::NotFound("/x.tif".into())),
            RasterError::NotFound(_)
        ));
        assert!(matches!(
            RasterError::from(CoverageError::decode("/x.tif", "bad magic")),
            RasterError::Decode(_)
        ));
        assert!(matches!(
            RasterError::from(CoverageError::empty_result("no overlap")),
            RasterError::EmptyResult(_)
        ));
        assert!(matches!(
            RasterError::from(CoverageError::Config("tile".into())),
            RasterError::Encode(_)
        ));
    }

    #[test]
    fn test_write_path_is_always_encode() {
        let err = RasterError::from_write(CoverageError::invalid("no pixels"));
        assert_eq!(err.kind(), "Encode");
        assert!(err.to_string().contains("no pixels"));
    }

    #[test]
    fn test_kind_and_input_classification() {
        let err = RasterError::Index { index: 3, count: 1 };
        assert_eq!(err.kind(), "Index");
        assert!(err.is_input_error());
        assert_eq!(err.to_string(), "Band index 3 out of range for 1 bands");

        assert!(!RasterError::Decode("x".into()).is_input_error());
        assert_eq!(RasterError::shape("ragged").kind(), "Shape");
    }
}
