//! Reading and writing rasters on disk.

use std::path::Path;

use coverage_processor::{read_coverage, write_coverage, WriteConfig};
use tracing::{debug, info};

use crate::error::{RasterError, Result};
use crate::info::{build_raster_info, RasterInfo};

/// Read the raster at `path`, detecting its format from content.
///
/// A missing file is [`RasterError::NotFound`]; anything that exists but
/// cannot be decoded is [`RasterError::Decode`].
pub fn read_raster(path: impl AsRef<Path>) -> Result<RasterInfo> {
    let path = path.as_ref();
    let coverage = read_coverage(path)?;
    let raster = build_raster_info(coverage)?;
    debug!(
        path = %path.display(),
        width = raster.width(),
        height = raster.height(),
        bands = raster.band_count(),
        "Read raster"
    );
    Ok(raster)
}

/// Write `raster` as a tiled, LZW-compressed GeoTIFF with default settings.
pub fn write_raster(raster: &RasterInfo, path: impl AsRef<Path>) -> Result<()> {
    write_raster_with(raster, path, &WriteConfig::default())
}

/// Write `raster` as GeoTIFF using `config`.
///
/// The file is written next to `path` under a temporary name and renamed
/// into place, so a failed write never leaves a truncated file at `path`.
/// Every failure is [`RasterError::Encode`].
pub fn write_raster_with(
    raster: &RasterInfo,
    path: impl AsRef<Path>,
    config: &WriteConfig,
) -> Result<()> {
    let path = path.as_ref();
    write_coverage(raster.coverage(), path, config).map_err(RasterError::from_write)?;
    info!(
        path = %path.display(),
        compression = %config.compression,
        tile_width = config.tile_width,
        tile_height = config.tile_height,
        "Wrote raster"
    );
    Ok(())
}
