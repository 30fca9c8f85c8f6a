//! Error types for coverage processing.

use std::path::PathBuf;

use projection::CrsError;
use thiserror::Error;

/// Errors that can occur while reading, writing or transforming coverages.
#[derive(Error, Debug)]
pub enum CoverageError {
    /// The input file does not exist.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The input could not be decoded as a raster.
    #[error("failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// The coverage could not be encoded.
    #[error("failed to encode coverage: {0}")]
    Encode(String),

    /// A coordinate transform failed.
    #[error("transform failed: {0}")]
    Transform(String),

    /// An operation produced no pixels.
    #[error("empty result: {0}")]
    EmptyResult(String),

    /// Coverage parts do not fit together.
    #[error("invalid coverage: {0}")]
    InvalidCoverage(String),

    /// Invalid write configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage/IO error.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoverageError {
    /// Create a Decode error.
    pub fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an Encode error.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Create a Transform error.
    pub fn transform(msg: impl Into<String>) -> Self {
        Self::Transform(msg.into())
    }

    /// Create an EmptyResult error.
    pub fn empty_result(msg: impl Into<String>) -> Self {
        Self::EmptyResult(msg.into())
    }

    /// Create an InvalidCoverage error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidCoverage(msg.into())
    }

    /// Create an Io error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<CrsError> for CoverageError {
    fn from(err: CrsError) -> Self {
        Self::Transform(err.to_string())
    }
}

impl From<tiff::TiffError> for CoverageError {
    fn from(err: tiff::TiffError) -> Self {
        Self::Encode(err.to_string())
    }
}

/// Result type for coverage operations.
pub type Result<T> = std::result::Result<T, CoverageError>;
