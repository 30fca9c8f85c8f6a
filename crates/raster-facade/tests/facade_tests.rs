//! Behaviour of the public facade against files on disk.

use coverage_processor::{RenderedImage, SampleDimension};
use raster_common::BoundingBox;
use raster_facade::{
    band_stats, build_raster_info, crop, decode_crs, make_envelope, matrix_to_raster, read_raster,
    reproject, resample, write_raster, write_raster_with, GridCoverage, GridGeometry, RasterError,
    RasterInfo, TiffCompression, WriteConfig,
};
use test_utils::{ascending_matrix, fixtures, init_test_tracing, scratch_dir, write_fixture};

const ASCII_GRID: &str = "ncols 5
nrows 4
xllcorner 2.0
yllcorner 48.0
cellsize 0.25
NODATA_value -9999
1 2 3 4 5
6 7 -9999 9 10
11 12 13 14 15
16 17 18 19 20
";

fn read_fixture_grid(dir: &std::path::Path) -> RasterInfo {
    let asc = write_fixture(dir, "dem.asc", ASCII_GRID);
    write_fixture(dir, "dem.prj", fixtures::wkt::WGS84);
    read_raster(asc).unwrap()
}

fn mercator_ramp(size: usize) -> RasterInfo {
    let envelope = make_envelope(fixtures::crs::EPSG_3857, 0.0, 0.0, 100.0, 100.0).unwrap();
    matrix_to_raster("ramp", &ascending_matrix(size, size), &envelope).unwrap()
}

#[test]
fn test_write_then_read_round_trip() {
    init_test_tracing();
    let dir = scratch_dir();
    let raster = read_fixture_grid(dir.path());
    assert_eq!(raster.name(), "dem");

    let path = dir.path().join("dem.tif");
    write_raster(&raster, &path).unwrap();
    let back = read_raster(&path).unwrap();

    assert_eq!(back.crs(), raster.crs());
    assert_eq!(back.projection(), raster.projection());
    assert_eq!(back.grid(), raster.grid());
    assert_eq!(back.bands(), raster.bands());
    assert_eq!(back.envelope(), raster.envelope());
    assert_eq!(back.image().band(0), raster.image().band(0));
}

#[test]
fn test_projected_round_trip_with_deflate() {
    init_test_tracing();
    let dir = scratch_dir();
    let raster = mercator_ramp(20);

    let config = WriteConfig {
        compression: TiffCompression::Deflate,
        tile_width: 16,
        tile_height: 16,
        ..Default::default()
    };
    let path = dir.path().join("ramp.tif");
    write_raster_with(&raster, &path, &config).unwrap();
    let back = read_raster(&path).unwrap();

    assert_eq!(back.name(), "ramp");
    assert_eq!(back.crs(), raster.crs());
    assert!(back.projection().is_some());
    assert_eq!(back.projection(), raster.projection());
    assert_eq!(back.grid(), raster.grid());
    assert_eq!(back.bands(), raster.bands());
}

#[test]
fn test_multiband_round_trip() {
    init_test_tracing();
    let dir = scratch_dir();
    let grid = GridGeometry::from_bbox(&BoundingBox::new(2.0, 48.0, 2.5, 48.5), 5, 5).unwrap();
    let planes: Vec<Vec<f32>> = (0..3)
        .map(|band| (0..25).map(|i| (band * 100 + i) as f32).collect())
        .collect();
    let bands = ["red", "green", "blue"].map(SampleDimension::new).to_vec();
    let coverage = GridCoverage::new(
        "rgb",
        decode_crs(fixtures::crs::EPSG_4326).unwrap(),
        grid,
        bands,
        RenderedImage::new(5, 5, planes).unwrap(),
    )
    .unwrap();
    let raster = build_raster_info(coverage).unwrap();

    let path = dir.path().join("rgb.tif");
    write_raster(&raster, &path).unwrap();
    let back = read_raster(&path).unwrap();

    assert_eq!(back.band_count(), 3);
    assert_eq!(back.bands(), raster.bands());
    assert_eq!(back.bands()[2].name, "blue");
    for band in 0..3 {
        assert_eq!(back.image().band(band), raster.image().band(band));
    }
    assert_eq!(back.sample(4, 4, 1), Some(124.0));
}

#[test]
fn test_reproject_to_same_crs() {
    let dir = scratch_dir();
    let raster = read_fixture_grid(dir.path());
    let same = reproject(&raster, raster.crs()).unwrap();
    assert_eq!(same.crs(), raster.crs());
    assert!(same.grid().approx_eq(raster.grid(), 1e-9));
}

#[test]
fn test_reproject_changes_envelope_crs() {
    let dir = scratch_dir();
    let raster = read_fixture_grid(dir.path());
    let mercator = decode_crs(fixtures::crs::EPSG_3857).unwrap();

    let projected = reproject(&raster, &mercator).unwrap();
    assert_eq!(projected.crs(), &mercator);
    assert_eq!(projected.envelope().crs(), &mercator);
    assert!(projected.projection().is_some());
    assert_ne!(projected.envelope().bbox(), raster.envelope().bbox());
    assert_eq!((projected.width(), projected.height()), (5, 4));
    // the input is untouched
    assert!(raster.projection().is_none());
}

#[test]
fn test_reproject_without_inverse_is_transform_error() {
    let far = make_envelope(fixtures::crs::EPSG_3857, 1.0e12, 1.0e12, 1000.0, 1000.0).unwrap();
    let raster = matrix_to_raster("far", &ascending_matrix(8, 8), &far).unwrap();
    let wgs84 = decode_crs(fixtures::crs::EPSG_4326).unwrap();

    let err = reproject(&raster, &wgs84).unwrap_err();
    assert!(matches!(err, RasterError::Transform(_)));
    assert_eq!(err.kind(), "Transform");
}

#[test]
fn test_resample_matches_target_grid() {
    let dir = scratch_dir();
    let r1 = read_fixture_grid(dir.path());
    let target = GridGeometry::from_bbox(&BoundingBox::new(2.0, 48.0, 3.25, 49.0), 10, 8).unwrap();

    let resampled = resample(&r1, &target).unwrap();
    assert_eq!((resampled.width(), resampled.height()), (10, 8));
    assert_ne!((resampled.width(), resampled.height()), (r1.width(), r1.height()));
    assert_eq!(resampled.grid(), &target);
    assert_eq!(resampled.crs(), r1.crs());
}

#[test]
fn test_resample_onto_empty_grid_fails() {
    let dir = scratch_dir();
    let raster = read_fixture_grid(dir.path());
    let mut target = *raster.grid();
    target.width = 0;

    let err = resample(&raster, &target).unwrap_err();
    assert!(matches!(err, RasterError::Descriptor(_)));
}

#[test]
fn test_crop_shrinks_extent() {
    let dir = scratch_dir();
    let raster = read_fixture_grid(dir.path());
    let inner = make_envelope(fixtures::crs::EPSG_4326, 2.25, 48.25, 0.5, 0.5).unwrap();
    assert!(raster.envelope().contains(&inner));

    let cropped = crop(&raster, &inner).unwrap();
    assert_ne!(cropped.envelope(), raster.envelope());
    assert_eq!((cropped.width(), cropped.height()), (2, 2));
}

#[test]
fn test_crop_inset_below_one_pixel_still_shrinks() {
    let dir = scratch_dir();
    let raster = read_fixture_grid(dir.path());
    // every edge sits less than a cell inside the raster
    let inset = make_envelope(fixtures::crs::EPSG_4326, 2.1, 48.1, 1.0, 0.8).unwrap();
    assert!(raster.envelope().contains(&inset));

    let cropped = crop(&raster, &inset).unwrap();
    assert_ne!(cropped.envelope(), raster.envelope());
    assert_eq!((cropped.width(), cropped.height()), (3, 2));
    assert!(raster.envelope().contains(cropped.envelope()));
}

#[test]
fn test_crop_without_overlap() {
    let raster = mercator_ramp(10);
    let away = make_envelope(fixtures::crs::EPSG_3857, 500.0, 500.0, 10.0, 10.0).unwrap();
    let err = crop(&raster, &away).unwrap_err();
    assert_eq!(err.kind(), "EmptyResult");
}

#[test]
fn test_matrix_to_raster() {
    let raster = mercator_ramp(100);
    assert_eq!((raster.width(), raster.height()), (100, 100));
    assert_eq!(raster.crs(), &decode_crs(fixtures::crs::EPSG_3857).unwrap());
    assert_eq!(raster.band_count(), 1);

    let stats = band_stats(&raster, 0).unwrap();
    assert_eq!(stats.min, 0.0);
    assert_eq!(stats.max, 9999.0);
    assert!(matches!(band_stats(&raster, 1), Err(RasterError::Index { .. })));
}

#[test]
fn test_no_data_is_excluded_from_stats() {
    let dir = scratch_dir();
    let raster = read_fixture_grid(dir.path());
    let stats = band_stats(&raster, 0).unwrap();
    assert_eq!((stats.min, stats.max), (1.0, 20.0));
    assert_eq!(stats.no_data, Some(-9999.0));
}

#[test]
fn test_unknown_crs_code() {
    let err = decode_crs(fixtures::crs::UNKNOWN).unwrap_err();
    assert!(matches!(err, RasterError::CrsLookup(_)));
}

#[test]
fn test_missing_file() {
    let err = read_raster("/no/such/file.tif").unwrap_err();
    assert!(matches!(err, RasterError::NotFound(_)));
}

#[test]
fn test_corrupt_file_is_decode_error() {
    let dir = scratch_dir();
    let path = write_fixture(dir.path(), "broken.tif", "II*\0 not really a tiff");
    let err = read_raster(path).unwrap_err();
    assert!(matches!(err, RasterError::Decode(_)));
}

#[test]
fn test_write_into_missing_directory() {
    let dir = scratch_dir();
    let raster = mercator_ramp(4);
    let path = dir.path().join("missing").join("out.tif");
    let err = write_raster(&raster, &path).unwrap_err();
    assert!(matches!(err, RasterError::Encode(_)));
    assert!(!path.exists());
}

#[test]
fn test_invalid_write_config() {
    let dir = scratch_dir();
    let raster = mercator_ramp(4);
    let config = WriteConfig {
        compression_quality: 2.0,
        ..Default::default()
    };
    let path = dir.path().join("out.tif");
    assert!(matches!(
        write_raster_with(&raster, &path, &config),
        Err(RasterError::Encode(_))
    ));
    assert!(!path.exists());
}
