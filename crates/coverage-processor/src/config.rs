//! Configuration for coverage encoding and resampling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CoverageError, Result};

/// TIFF requires tile dimensions to be multiples of 16.
const TILE_MULTIPLE: u32 = 16;

/// Settings for GeoTIFF output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    /// Compression codec for tile data.
    pub compression: TiffCompression,

    /// Quality factor in `[0, 1]`.
    ///
    /// Mapped onto the zlib level for Deflate. LZW is lossless and has no
    /// level, so the value is kept only for reporting.
    pub compression_quality: f32,

    /// Tile width in pixels.
    pub tile_width: u32,

    /// Tile height in pixels.
    pub tile_height: u32,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            compression: TiffCompression::Lzw,
            compression_quality: 0.75,
            tile_width: 256,
            tile_height: 16,
        }
    }
}

impl WriteConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults; unparseable ones are logged and
    /// ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RASTER_WRITE_COMPRESSION") {
            match val.parse() {
                Ok(compression) => config.compression = compression,
                Err(e) => warn!(value = %val, error = %e, "Ignoring RASTER_WRITE_COMPRESSION"),
            }
        }

        if let Ok(val) = std::env::var("RASTER_WRITE_QUALITY") {
            match val.parse() {
                Ok(quality) => config.compression_quality = quality,
                Err(_) => warn!(value = %val, "Ignoring RASTER_WRITE_QUALITY"),
            }
        }

        if let Ok(val) = std::env::var("RASTER_TILE_WIDTH") {
            if let Ok(size) = val.parse() {
                config.tile_width = size;
            }
        }

        if let Ok(val) = std::env::var("RASTER_TILE_HEIGHT") {
            if let Ok(size) = val.parse() {
                config.tile_height = size;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(CoverageError::Config(
                "tile dimensions must be > 0".to_string(),
            ));
        }

        if self.tile_width % TILE_MULTIPLE != 0 || self.tile_height % TILE_MULTIPLE != 0 {
            return Err(CoverageError::Config(format!(
                "tile dimensions must be multiples of {TILE_MULTIPLE}, got {}x{}",
                self.tile_width, self.tile_height
            )));
        }

        if !(0.0..=1.0).contains(&self.compression_quality) {
            return Err(CoverageError::Config(format!(
                "compression_quality must be within [0, 1], got {}",
                self.compression_quality
            )));
        }

        Ok(())
    }

    /// zlib level (0-9) derived from the quality factor.
    pub fn deflate_level(&self) -> u32 {
        (self.compression_quality.clamp(0.0, 1.0) * 9.0).round() as u32
    }
}

/// Compression codec for GeoTIFF tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TiffCompression {
    /// No compression.
    None,
    /// LZW (TIFF compression 5).
    #[default]
    Lzw,
    /// zlib Deflate (TIFF compression 8).
    Deflate,
}

impl TiffCompression {
    /// Value of the TIFF `Compression` tag.
    pub fn tag_value(self) -> u16 {
        match self {
            Self::None => 1,
            Self::Lzw => 5,
            Self::Deflate => 8,
        }
    }
}

impl FromStr for TiffCompression {
    type Err = CoverageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "uncompressed" => Ok(Self::None),
            "lzw" => Ok(Self::Lzw),
            "deflate" | "zlib" => Ok(Self::Deflate),
            other => Err(CoverageError::Config(format!(
                "unknown compression '{other}'"
            ))),
        }
    }
}

impl fmt::Display for TiffCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Lzw => write!(f, "lzw"),
            Self::Deflate => write!(f, "deflate"),
        }
    }
}

/// Interpolation method for reprojection and resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Nearest neighbor (preserves exact values).
    #[default]
    Nearest,
    /// Bilinear interpolation (smooth, slight value changes).
    Bilinear,
    /// Bicubic interpolation (smoothest, more compute).
    Cubic,
}

impl FromStr for InterpolationMethod {
    type Err = CoverageError;

    /// Parse from string (case-insensitive).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "bilinear" | "linear" => Ok(Self::Bilinear),
            "cubic" | "bicubic" => Ok(Self::Cubic),
            other => Err(CoverageError::Config(format!(
                "unknown interpolation method '{other}'"
            ))),
        }
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Bilinear => write!(f, "bilinear"),
            Self::Cubic => write!(f, "cubic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WriteConfig::default();
        assert_eq!(config.compression, TiffCompression::Lzw);
        assert_eq!(config.compression_quality, 0.75);
        assert_eq!((config.tile_width, config.tile_height), (256, 16));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_tiles() {
        let config = WriteConfig {
            tile_width: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WriteConfig {
            tile_height: 20,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_quality() {
        let config = WriteConfig {
            compression_quality: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CoverageError::Config(_))));
    }

    #[test]
    fn test_deflate_level() {
        let config = WriteConfig {
            compression: TiffCompression::Deflate,
            compression_quality: 1.0,
            ..Default::default()
        };
        assert_eq!(config.deflate_level(), 9);
        assert_eq!(WriteConfig::default().deflate_level(), 7);
    }

    #[test]
    fn test_serde_partial() {
        let config: WriteConfig = serde_json::from_str(r#"{"compression":"deflate"}"#).unwrap();
        assert_eq!(config.compression, TiffCompression::Deflate);
        assert_eq!(config.tile_width, 256);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("LZW".parse::<TiffCompression>().unwrap(), TiffCompression::Lzw);
        assert!("jpeg".parse::<TiffCompression>().is_err());
        assert_eq!(
            "BILINEAR".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::Bilinear
        );
        assert_eq!(
            "bicubic".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::Cubic
        );
        assert_eq!(InterpolationMethod::default(), InterpolationMethod::Nearest);
    }
}
