//! Error types for CRS handling.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving, parsing or applying coordinate systems.
#[derive(Debug, Error)]
pub enum CrsError {
    /// No definition is known for the code.
    #[error("unknown CRS code: {0}")]
    Lookup(String),

    /// A WKT or PROJ.4 definition could not be understood.
    #[error("invalid CRS definition: {0}")]
    Parse(String),

    /// A coordinate could not be carried from one system to another.
    #[error("coordinate transform failed: {0}")]
    Transform(String),

    /// The authority definitions file does not exist.
    #[error("authority definitions file not found: {}", .0.display())]
    DefinitionsNotFound(PathBuf),

    /// The authority definitions file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CrsError {
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn transform(msg: impl Into<String>) -> Self {
        Self::Transform(msg.into())
    }
}

/// Result type for CRS operations.
pub type Result<T> = std::result::Result<T, CrsError>;
