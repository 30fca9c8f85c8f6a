//! Common test fixtures for raster and CRS tests.

use std::path::{Path, PathBuf};

/// Common CRS identifiers.
pub mod crs {
    /// WGS84 geographic
    pub const EPSG_4326: &str = "EPSG:4326";

    /// Web Mercator
    pub const EPSG_3857: &str = "EPSG:3857";

    /// An authority nobody registers
    pub const UNKNOWN: &str = "NOPE:99999";
}

/// WKT definitions used across tests.
pub mod wkt {
    /// WGS84 geographic with its EPSG authority.
    pub const WGS84: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#;

    /// Lambert azimuthal equal area over Europe, no authority.
    pub const EUROPE_LAEA: &str = r#"PROJCS["Europe LAEA",GEOGCS["ETRS89",DATUM["European_Terrestrial_Reference_System_1989",SPHEROID["GRS 1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Lambert_Azimuthal_Equal_Area"],PARAMETER["latitude_of_center",52],PARAMETER["longitude_of_center",10],PARAMETER["false_easting",4321000],PARAMETER["false_northing",3210000],UNIT["metre",1]]"#;

    /// Syntactically broken WKT.
    pub const MALFORMED: &str = r#"PROJCS["broken",GEOGCS["#;
}

/// Properties text defining two custom systems: one WKT, one PROJ.4.
pub const AUTHORITY_DEFINITIONS: &str = r#"# custom coordinate systems
100001 = PROJCS["Europe LAEA",GEOGCS["ETRS89",DATUM["European_Terrestrial_Reference_System_1989",\
    SPHEROID["GRS 1980",6378137,298.257222101]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],\
    PROJECTION["Lambert_Azimuthal_Equal_Area"],PARAMETER["latitude_of_center",52],\
    PARAMETER["longitude_of_center",10],PARAMETER["false_easting",4321000],\
    PARAMETER["false_northing",3210000],UNIT["metre",1]]

! polar stereographic on a sphere
100002 = +proj=stere +lat_0=90 +lat_ts=60 +lon_0=-105 +x_0=0 +y_0=0 +R=6371229 +units=m +no_defs
"#;

/// Properties text whose second entry does not parse.
pub const BROKEN_AUTHORITY_DEFINITIONS: &str = "1 = +proj=longlat +datum=WGS84 +no_defs\n2 = PROJCS[\"broken\"\n";

/// Write `contents` to `dir/name` and return the path.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
    path
}

/// Fresh scratch directory removed on drop.
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap_or_else(|e| panic!("create temp dir: {e}"))
}
