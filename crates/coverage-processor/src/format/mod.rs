//! Reading and writing coverages on disk.

mod arcgrid;
mod chunks;
mod detect;
mod geotiff;

pub use detect::{detect_format, RasterFormat};
pub use geotiff::write_geotiff;

use std::path::Path;

use tracing::debug;

use crate::config::WriteConfig;
use crate::coverage::GridCoverage;
use crate::error::{CoverageError, Result};

/// Decode the raster at `path`, detecting its format.
///
/// The coverage is named after the file stem. A missing file is
/// [`CoverageError::NotFound`]; every other failure is
/// [`CoverageError::Decode`].
pub fn read_coverage(path: impl AsRef<Path>) -> Result<GridCoverage> {
    let path = path.as_ref();
    let format = sniff(path)?;
    let name = coverage_name(path);
    debug!(path = %path.display(), format = %format, "Reading coverage");

    match format {
        RasterFormat::GeoTiff => geotiff::read_geotiff(path, &name),
        RasterFormat::ArcGrid => arcgrid::read_arcgrid(path, &name),
    }
}

/// Decode only grid, CRS and band metadata, leaving the pixels on disk.
pub fn read_metadata(path: impl AsRef<Path>) -> Result<GridCoverage> {
    let path = path.as_ref();
    let format = sniff(path)?;
    let name = coverage_name(path);

    match format {
        RasterFormat::GeoTiff => geotiff::read_geotiff_metadata(path, &name),
        RasterFormat::ArcGrid => arcgrid::read_arcgrid_metadata(path, &name),
    }
}

/// Encode `coverage` to `path` as GeoTIFF.
pub fn write_coverage(
    coverage: &GridCoverage,
    path: impl AsRef<Path>,
    config: &WriteConfig,
) -> Result<()> {
    write_geotiff(coverage, path.as_ref(), config)
}

fn sniff(path: &Path) -> Result<RasterFormat> {
    if !path.is_file() {
        return Err(CoverageError::NotFound(path.to_path_buf()));
    }
    detect_format(path)
}

fn coverage_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "coverage".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_coverage("/no/such/file.tif"),
            Err(CoverageError::NotFound(_))
        ));
        assert!(matches!(
            read_metadata("/no/such/file.asc"),
            Err(CoverageError::NotFound(_))
        ));
    }

    #[test]
    fn test_directory_is_not_a_raster() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_coverage(dir.path()),
            Err(CoverageError::NotFound(_))
        ));
    }

    #[test]
    fn test_coverage_name() {
        assert_eq!(coverage_name(Path::new("/data/dem.tif")), "dem");
        assert_eq!(coverage_name(Path::new("/")), "coverage");
    }
}
