//! CRS utilities and the authority registry as seen through the facade.

use raster_facade::{
    crs_to_code, crs_to_wkt, decode_crs, make_envelope, matrix_to_raster, parse_crs_wkt,
    register_authority_definitions, RasterError,
};
use test_utils::{fixtures, scratch_dir, write_fixture, AUTHORITY_DEFINITIONS, BROKEN_AUTHORITY_DEFINITIONS};

#[test]
fn test_code_and_wkt_round_trip() {
    let crs = decode_crs(fixtures::crs::EPSG_4326).unwrap();
    assert_eq!(crs_to_code(&crs).unwrap().to_string(), "EPSG:4326");

    let reparsed = parse_crs_wkt(&crs_to_wkt(&crs)).unwrap();
    assert_eq!(reparsed, crs);
}

#[test]
fn test_malformed_wkt() {
    assert!(matches!(
        parse_crs_wkt(fixtures::wkt::MALFORMED),
        Err(RasterError::CrsParse(_))
    ));
}

#[test]
fn test_registered_codes_become_decodable() {
    let dir = scratch_dir();
    let path = write_fixture(dir.path(), "facade.properties", AUTHORITY_DEFINITIONS);

    assert!(matches!(decode_crs("FACADE:100002"), Err(RasterError::CrsLookup(_))));
    assert_eq!(register_authority_definitions("FACADE", &path).unwrap(), 2);

    let polar = decode_crs("FACADE:100002").unwrap();
    assert!(!polar.is_geographic());

    let envelope = make_envelope("FACADE:100001", 4321000.0, 3210000.0, 1000.0, 1000.0).unwrap();
    let raster = matrix_to_raster("laea", &[[1.0, 2.0], [3.0, 4.0]], &envelope).unwrap();
    assert!(raster.projection().is_some());

    // reverse lookup finds the registered code for an equal WKT definition
    let laea = parse_crs_wkt(fixtures::wkt::EUROPE_LAEA).unwrap();
    assert_eq!(crs_to_code(&laea).unwrap().to_string(), "FACADE:100001");
}

#[test]
fn test_broken_definitions_register_nothing() {
    let dir = scratch_dir();
    let path = write_fixture(dir.path(), "broken.properties", BROKEN_AUTHORITY_DEFINITIONS);

    let err = register_authority_definitions("FACADEBROKEN", &path).unwrap_err();
    assert!(matches!(err, RasterError::CrsParse(_)));
    assert!(decode_crs("FACADEBROKEN:1").is_err());
}

#[test]
fn test_missing_definitions_file() {
    let err = register_authority_definitions("FACADEMISSING", "/no/such/defs.properties").unwrap_err();
    assert!(matches!(err, RasterError::NotFound(_)));
}
