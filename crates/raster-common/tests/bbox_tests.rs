//! Tests for BoundingBox and AffineTransform interplay.

use raster_common::{AffineTransform, BboxParseError, BoundingBox};

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
    assert_eq!(bbox.min_x, -180.0);
    assert_eq!(bbox.min_y, -90.0);
    assert_eq!(bbox.max_x, 180.0);
    assert_eq!(bbox.max_y, 90.0);
    assert!(bbox.is_valid());
}

#[test]
fn test_bbox_from_points_empty() {
    assert!(BoundingBox::from_points(Vec::new()).is_none());
}

#[test]
fn test_bbox_invalid_when_inverted() {
    let bbox = BoundingBox::new(10.0, 10.0, 5.0, 5.0);
    assert!(!bbox.is_valid());
}

#[test]
fn test_bbox_invalid_when_nan() {
    let bbox = BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0);
    assert!(!bbox.is_valid());
}

#[test]
fn test_bbox_degenerate_is_empty() {
    assert!(BoundingBox::new(0.0, 0.0, 0.0, 10.0).is_empty());
    assert!(!BoundingBox::new(0.0, 0.0, 1.0, 10.0).is_empty());
}

// ============================================================================
// from_csv tests
// ============================================================================

#[test]
fn test_parse_csv_with_spaces() {
    let bbox = BoundingBox::from_csv(" 0, 1 ,2,3 ").unwrap();
    assert_eq!(bbox, BoundingBox::new(0.0, 1.0, 2.0, 3.0));
}

#[test]
fn test_parse_csv_too_few() {
    let result = BoundingBox::from_csv("0,0,100");
    assert!(matches!(result, Err(BboxParseError::InvalidFormat(_))));
}

#[test]
fn test_parse_csv_bad_number() {
    let result = BoundingBox::from_csv("0,0,abc,100");
    assert!(matches!(result, Err(BboxParseError::InvalidNumber(_))));
}

// ============================================================================
// Containment
// ============================================================================

#[test]
fn test_contains_box() {
    let outer = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
    let inner = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
    assert!(outer.contains(&inner));
    assert!(!inner.contains(&outer));
    assert!(outer.contains(&outer));
}

#[test]
fn test_contains_point_on_edge() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(bbox.contains_point(0.0, 10.0));
    assert!(!bbox.contains_point(-0.1, 5.0));
}

// ============================================================================
// Affine interplay
// ============================================================================

#[test]
fn test_offset_window_bounds() {
    let gt = AffineTransform::north_up(0.0, 100.0, 1.0, 1.0);
    let window = gt.offset(10.0, 20.0);
    let bounds = window.bounds(5, 5);
    assert_eq!(bounds, BoundingBox::new(10.0, 75.0, 15.0, 80.0));
}

#[test]
fn test_gdal_roundtrip() {
    let coeffs = [1.0, 2.0, 0.0, 3.0, 0.0, -4.0];
    assert_eq!(AffineTransform::from_gdal(coeffs).to_gdal(), coeffs);
}
