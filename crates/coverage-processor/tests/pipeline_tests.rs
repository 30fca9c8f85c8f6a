//! End-to-end tests: decode, transform and re-encode coverages on disk.

use coverage_processor::{
    crop, read_coverage, read_metadata, reproject, resample, write_coverage, CoverageError,
    Envelope, GridGeometry, InterpolationMethod, TiffCompression, WriteConfig,
};
use projection::decode_crs;
use raster_common::BoundingBox;
use test_utils::{fixtures, init_test_tracing, scratch_dir, write_fixture};

const ASCII_GRID: &str = "ncols 4
nrows 3
xllcorner 10.0
yllcorner 40.0
cellsize 0.5
NODATA_value -9999
1 2 3 4
5 6 -9999 8
9 10 11 12
";

#[test]
fn test_ascii_grid_to_geotiff() {
    init_test_tracing();
    let dir = scratch_dir();
    let asc = write_fixture(dir.path(), "elevation.asc", ASCII_GRID);
    write_fixture(dir.path(), "elevation.prj", fixtures::wkt::WGS84);

    let coverage = read_coverage(&asc).unwrap();
    assert_eq!(coverage.name(), "elevation");
    assert_eq!(coverage.crs(), &decode_crs(fixtures::crs::EPSG_4326).unwrap());

    let tif = dir.path().join("elevation.tif");
    write_coverage(&coverage, &tif, &WriteConfig::default()).unwrap();

    let back = read_coverage(&tif).unwrap();
    assert_eq!(back.name(), "elevation");
    assert_eq!(back.crs(), coverage.crs());
    assert_eq!(back.grid(), coverage.grid());
    assert_eq!(back.bands(), coverage.bands());
    assert_eq!(
        back.image().unwrap().band(0),
        coverage.image().unwrap().band(0)
    );

    let header = read_metadata(&tif).unwrap();
    assert_eq!(header.grid(), coverage.grid());
    assert!(header.image().is_none());
}

#[test]
fn test_reproject_then_crop() {
    init_test_tracing();
    let dir = scratch_dir();
    let asc = write_fixture(dir.path(), "grid.asc", ASCII_GRID);
    write_fixture(dir.path(), "grid.prj", fixtures::wkt::WGS84);
    let coverage = read_coverage(&asc).unwrap();

    let mercator = decode_crs(fixtures::crs::EPSG_3857).unwrap();
    let projected = reproject(&coverage, &mercator, InterpolationMethod::Nearest).unwrap();
    assert_eq!(projected.crs(), &mercator);
    assert_eq!((projected.grid().width, projected.grid().height), (4, 3));

    // crop with an envelope given in degrees
    let wgs84 = decode_crs(fixtures::crs::EPSG_4326).unwrap();
    let window = Envelope::from_corners(wgs84, (10.2, 40.2), (11.0, 41.0));
    let cropped = crop(&projected, &window).unwrap();
    assert_eq!(cropped.crs(), &mercator);
    assert!(cropped.grid().width < projected.grid().width);
    assert_ne!(cropped.grid().envelope(), projected.grid().envelope());
}

#[test]
fn test_resample_and_write_deflate() {
    init_test_tracing();
    let dir = scratch_dir();
    let asc = write_fixture(dir.path(), "grid.asc", ASCII_GRID);
    write_fixture(dir.path(), "grid.prj", fixtures::wkt::WGS84);
    let coverage = read_coverage(&asc).unwrap();

    let target = GridGeometry::from_bbox(&BoundingBox::new(10.0, 40.0, 12.0, 41.5), 8, 6).unwrap();
    let resampled = resample(&coverage, &target, InterpolationMethod::Bilinear).unwrap();
    assert_eq!(resampled.grid(), &target);

    let config = WriteConfig {
        compression: TiffCompression::Deflate,
        tile_width: 16,
        tile_height: 16,
        ..Default::default()
    };
    let tif = dir.path().join("resampled.tif");
    write_coverage(&resampled, &tif, &config).unwrap();
    let back = read_coverage(&tif).unwrap();
    assert_eq!(back.grid(), &target);
}

#[test]
fn test_bad_config_is_rejected_before_writing() {
    let dir = scratch_dir();
    let asc = write_fixture(dir.path(), "grid.asc", ASCII_GRID);
    write_fixture(dir.path(), "grid.prj", fixtures::wkt::WGS84);
    let coverage = read_coverage(&asc).unwrap();

    let config = WriteConfig {
        tile_width: 100,
        ..Default::default()
    };
    let tif = dir.path().join("never.tif");
    assert!(matches!(
        write_coverage(&coverage, &tif, &config),
        Err(CoverageError::Config(_))
    ));
    assert!(!tif.exists());
}
