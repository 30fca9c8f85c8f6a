//! Authority-qualified CRS codes.

use std::fmt;

use crate::error::{CrsError, Result};

/// An authority name plus a code inside that authority, e.g. `EPSG:4326`.
///
/// The authority is stored upper-cased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrsCode {
    authority: String,
    code: String,
}

impl CrsCode {
    pub fn new(authority: impl AsRef<str>, code: impl AsRef<str>) -> Self {
        Self {
            authority: authority.as_ref().trim().to_ascii_uppercase(),
            code: code.as_ref().trim().to_string(),
        }
    }

    /// EPSG code shortcut.
    pub fn epsg(code: u32) -> Self {
        Self::new("EPSG", code.to_string())
    }

    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326", "epsg:4326"
    /// - "urn:ogc:def:crs:EPSG::3857" (optionally with a version segment)
    /// - "http://www.opengis.net/def/crs/EPSG/0/4326"
    /// - "CRS:84" (mapped to EPSG:4326, which is stored lon/lat here anyway)
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();

        if lower == "crs:84" || lower == "ogc:crs84" {
            return Ok(Self::epsg(4326));
        }

        if lower.starts_with("urn:ogc:def:crs:") {
            // urn:ogc:def:crs:{authority}:{version}:{code}
            let rest = &trimmed["urn:ogc:def:crs:".len()..];
            let parts: Vec<&str> = rest.split(':').collect();
            return match parts.as_slice() {
                [authority, _, code] | [authority, code] => {
                    Self::checked(authority, code, s)
                }
                _ => Err(CrsError::lookup(format!("malformed URN: {s}"))),
            };
        }

        if lower.starts_with("http://www.opengis.net/def/crs/") {
            let rest = &trimmed["http://www.opengis.net/def/crs/".len()..];
            let parts: Vec<&str> = rest.split('/').collect();
            return match parts.as_slice() {
                [authority, _version, code] => Self::checked(authority, code, s),
                _ => Err(CrsError::lookup(format!("malformed CRS URL: {s}"))),
            };
        }

        match trimmed.split_once(':') {
            Some((authority, code)) => Self::checked(authority, code, s),
            None => Err(CrsError::lookup(format!(
                "expected AUTHORITY:CODE, got '{s}'"
            ))),
        }
    }

    fn checked(authority: &str, code: &str, original: &str) -> Result<Self> {
        if authority.trim().is_empty() || code.trim().is_empty() {
            return Err(CrsError::lookup(format!(
                "missing authority or code in '{original}'"
            )));
        }
        Ok(Self::new(authority, code))
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Numeric EPSG code, if this is an EPSG identifier that fits in a GeoKey.
    pub fn epsg_code(&self) -> Option<u16> {
        if self.authority == "EPSG" {
            self.code.parse().ok()
        } else {
            None
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!(CrsCode::parse("EPSG:4326").unwrap(), CrsCode::epsg(4326));
        assert_eq!(CrsCode::parse("epsg:3857").unwrap(), CrsCode::epsg(3857));
        assert_eq!(CrsCode::parse("CRS:84").unwrap(), CrsCode::epsg(4326));
        assert_eq!(
            CrsCode::parse("urn:ogc:def:crs:EPSG::32633").unwrap(),
            CrsCode::epsg(32633)
        );
        assert_eq!(
            CrsCode::parse("urn:ogc:def:crs:EPSG:6.6:4326").unwrap(),
            CrsCode::epsg(4326)
        );
        assert_eq!(
            CrsCode::parse("http://www.opengis.net/def/crs/EPSG/0/3031").unwrap(),
            CrsCode::epsg(3031)
        );
        assert_eq!(
            CrsCode::parse("custom:100001").unwrap().to_string(),
            "CUSTOM:100001"
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(CrsCode::parse("4326").is_err());
        assert!(CrsCode::parse("EPSG:").is_err());
        assert!(CrsCode::parse(":4326").is_err());
    }

    #[test]
    fn test_epsg_code() {
        assert_eq!(CrsCode::epsg(3857).epsg_code(), Some(3857));
        assert_eq!(CrsCode::new("ESRI", "54030").epsg_code(), None);
    }
}
