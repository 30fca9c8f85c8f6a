//! Coverage operations over synthetic grids.

use coverage_processor::{
    crop, reproject, resample, Envelope, GridCoverage, GridGeometry, InterpolationMethod,
    RenderedImage, SampleDimension,
};
use projection::Crs;
use raster_common::BoundingBox;
use test_utils::{
    assert_approx_eq, assert_bbox_approx_eq, assert_coords_approx_eq, create_constant_grid,
    create_grid_with_nans, create_test_grid, plane_matrix,
};

fn coverage(crs: Crs, bbox: BoundingBox, width: usize, height: usize, plane: Vec<f32>) -> GridCoverage {
    let grid = GridGeometry::from_bbox(&bbox, width, height).unwrap();
    let image = RenderedImage::new(width, height, vec![plane]).unwrap();
    GridCoverage::new("synthetic", crs, grid, vec![SampleDimension::new("band_1")], image).unwrap()
}

fn wgs84() -> Crs {
    Crs::from_epsg(4326).unwrap()
}

#[test]
fn test_resample_onto_own_grid_keeps_values() {
    let source = coverage(wgs84(), BoundingBox::new(0.0, 0.0, 6.0, 4.0), 6, 4, create_test_grid(6, 4));
    let result = resample(&source, source.grid(), InterpolationMethod::Nearest).unwrap();

    let image = result.image().unwrap();
    assert_eq!(image.band(0), source.image().unwrap().band(0));
    assert_eq!(image.get(3, 2, 0), Some(3002.0));
}

#[test]
fn test_bilinear_reproduces_plane() {
    let plane: Vec<f32> = plane_matrix(4, 4)
        .into_iter()
        .flatten()
        .map(|v| v as f32)
        .collect();
    let source = coverage(wgs84(), BoundingBox::new(0.0, 0.0, 4.0, 4.0), 4, 4, plane);
    let target = GridGeometry::from_bbox(&BoundingBox::new(0.0, 0.0, 4.0, 4.0), 8, 8).unwrap();

    let result = resample(&source, &target, InterpolationMethod::Bilinear).unwrap();
    // output pixel (3, 3) samples the source at (1.25, 1.25)
    let value = result.image().unwrap().get(3, 3, 0).unwrap();
    assert_approx_eq!(value, 13.75, 1e-5);
}

#[test]
fn test_nan_gaps_survive_resampling() {
    let source = coverage(
        wgs84(),
        BoundingBox::new(0.0, 0.0, 4.0, 4.0),
        4,
        4,
        create_grid_with_nans(4, 4, &[(1, 1)]),
    );
    let result = resample(&source, source.grid(), InterpolationMethod::Nearest).unwrap();
    let image = result.image().unwrap();
    assert!(image.get(1, 1, 0).unwrap().is_nan());
    assert_eq!(image.get(2, 1, 0), Some(0.0));
}

#[test]
fn test_crop_snaps_to_pixels() {
    let source = coverage(
        wgs84(),
        BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        10,
        10,
        create_constant_grid(10, 10, 7.0),
    );
    let window = Envelope::from_corners(wgs84(), (2.5, 2.5), (5.5, 5.5));
    let cropped = crop(&source, &window).unwrap();

    let b = cropped.grid().envelope();
    assert_bbox_approx_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (2.0, 2.0, 6.0, 6.0), 1e-9);
    let (x, y) = cropped.grid().pixel_to_world(0.5, 0.5);
    assert_coords_approx_eq!((x, y), (2.5, 5.5), 1e-9);
    assert!(cropped.image().unwrap().band(0).unwrap().iter().all(|&v| v == 7.0));
}

#[test]
fn test_reproject_extent_to_web_mercator() {
    let source = coverage(
        wgs84(),
        BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        10,
        10,
        create_test_grid(10, 10),
    );
    let mercator = Crs::from_epsg(3857).unwrap();
    let result = reproject(&source, &mercator, InterpolationMethod::Nearest).unwrap();

    let b = result.grid().envelope();
    assert_bbox_approx_eq!(
        (b.min_x, b.min_y, b.max_x, b.max_y),
        (0.0, 0.0, 1113194.9079, 1118889.9749),
        1e-2
    );
    assert_eq!(result.envelope().crs(), &mercator);
}
