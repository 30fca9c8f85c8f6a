//! CRS lookup, parsing and the process-wide authority registry.

use std::path::Path;

use projection::{Crs, CrsCode};
use tracing::info;

use crate::error::Result;

/// Resolve an authority code such as `EPSG:4326` to a CRS.
pub fn decode_crs(code: &str) -> Result<Crs> {
    Ok(projection::decode_crs(code)?)
}

/// Parse a WKT CRS definition.
pub fn parse_crs_wkt(wkt: &str) -> Result<Crs> {
    Ok(projection::parse_crs_wkt(wkt)?)
}

/// Best-effort reverse lookup of the authority code for `crs`.
pub fn crs_to_code(crs: &Crs) -> Option<CrsCode> {
    projection::crs_to_code(crs)
}

/// WKT form of `crs`.
pub fn crs_to_wkt(crs: &Crs) -> String {
    projection::crs_to_wkt(crs)
}

/// Load `code = definition` entries from `path` under `authority`.
///
/// Registration is process-wide and permanent: every later
/// [`decode_crs`] call in any thread sees the new codes. Returns the number
/// of codes added.
pub fn register_authority_definitions(authority: &str, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let added = projection::register_authority_definitions(authority, path)?;
    info!(authority = authority, path = %path.display(), added = added, "Authority definitions available");
    Ok(added)
}
