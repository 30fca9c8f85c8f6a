//! Resolution between CRS identifiers, WKT text and [`Crs`] handles.

use tracing::debug;

use crate::code::CrsCode;
use crate::crs::Crs;
use crate::error::{CrsError, Result};
use crate::registry;
use crate::wkt;

/// EPSG codes tried by [`crs_to_code`] for handles that carry no identifier.
const COMMON_EPSG: &[u16] = &[4326, 3857, 4269, 4258, 4230, 4267, 3395, 3035, 3413, 3031];

/// Resolve an authority code to a CRS.
///
/// Custom authority definitions take precedence over the built-in EPSG
/// database, so a registered `EPSG:xxxx` shadows the bundled one.
pub fn decode_crs(code: &str) -> Result<Crs> {
    let parsed = CrsCode::parse(code)?;

    if let Some(crs) = registry::lookup(&parsed) {
        debug!(code = %parsed, "Resolved CRS from registered definitions");
        return Ok(crs);
    }

    match parsed.epsg_code() {
        Some(epsg) => Crs::from_epsg(epsg).map_err(|e| match e {
            CrsError::Lookup(_) => CrsError::lookup(code.trim()),
            other => other,
        }),
        None => Err(CrsError::lookup(code.trim())),
    }
}

/// Parse a WKT1 coordinate system definition.
pub fn parse_crs_wkt(text: &str) -> Result<Crs> {
    Crs::from_wkt(text)
}

/// Best-effort reverse lookup of an authority code.
///
/// Tries the handle's own identifier, the root `AUTHORITY` node of its WKT,
/// registered custom definitions, and finally a handful of common EPSG
/// systems. Returns `None` when nothing matches.
pub fn crs_to_code(crs: &Crs) -> Option<CrsCode> {
    if let Some(code) = crs.identifier() {
        return Some(code.clone());
    }

    if let Some((authority, code)) = wkt::parse(crs.wkt()).ok().and_then(|root| root.authority()) {
        return Some(CrsCode::new(authority, code));
    }

    if let Some(code) = registry::find_equal(crs) {
        return Some(code);
    }

    let mut candidates = COMMON_EPSG.iter().copied().chain(32601..=32660).chain(32701..=32760);
    candidates.find_map(|epsg| {
        Crs::from_epsg(epsg)
            .ok()
            .filter(|candidate| candidate.proj4().equivalent(crs.proj4()))
            .and_then(|candidate| candidate.identifier().cloned())
    })
}

/// WKT text of a CRS handle.
pub fn crs_to_wkt(crs: &Crs) -> String {
    crs.wkt().to_string()
}
