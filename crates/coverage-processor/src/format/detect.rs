//! Raster format detection: magic bytes first, file extension second.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CoverageError, Result};

/// Raster formats the processor can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    /// Classic or BigTIFF with GeoTIFF tags.
    GeoTiff,
    /// ESRI ASCII grid with an optional `.prj` sidecar.
    ArcGrid,
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeoTiff => write!(f, "GeoTIFF"),
            Self::ArcGrid => write!(f, "ESRI ASCII Grid"),
        }
    }
}

const TIFF_MAGIC: &[[u8; 4]] = &[
    *b"II*\0", // little-endian
    *b"MM\0*", // big-endian
    *b"II+\0", // BigTIFF little-endian
    *b"MM\0+", // BigTIFF big-endian
];

/// Detect the format of an existing file.
pub fn detect_format(path: &Path) -> Result<RasterFormat> {
    let mut head = [0u8; 16];
    let read = File::open(path)
        .and_then(|mut file| read_head(&mut file, &mut head))
        .map_err(|e| CoverageError::decode(path, e.to_string()))?;

    if let Some(format) = sniff(&head[..read]) {
        return Ok(format);
    }

    match extension(path).as_deref() {
        Some("tif") | Some("tiff") => Ok(RasterFormat::GeoTiff),
        Some("asc") => Ok(RasterFormat::ArcGrid),
        _ => Err(CoverageError::decode(path, "unrecognized raster format")),
    }
}

/// Format from leading bytes alone.
fn sniff(head: &[u8]) -> Option<RasterFormat> {
    if head.len() >= 4 && TIFF_MAGIC.iter().any(|magic| head[..4] == magic[..]) {
        return Some(RasterFormat::GeoTiff);
    }
    let text = String::from_utf8_lossy(head).trim_start().to_ascii_lowercase();
    if text.starts_with("ncols") || text.starts_with("nrows") {
        return Some(RasterFormat::ArcGrid);
    }
    None
}

fn read_head(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match file.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}
