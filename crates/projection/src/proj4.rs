//! PROJ.4 definition strings.
//!
//! proj4rs consumes these directly; this module only parses them into
//! key/value pairs so definitions can be inspected, compared and mapped to
//! WKT.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CrsError, Result};

/// Parameters that carry no geometric meaning and are ignored by equality.
const COSMETIC_KEYS: &[&str] = &["no_defs", "type", "wktext", "title"];

/// A parsed `+key=value +flag ...` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Proj4 {
    params: Vec<(String, Option<String>)>,
}

/// Reference ellipsoid expressed as semi-major axis and inverse flattening.
///
/// An inverse flattening of 0 denotes a sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub name: &'static str,
    pub proj_name: &'static str,
    pub semi_major: f64,
    pub inverse_flattening: f64,
}

pub const ELLIPSOIDS: &[Ellipsoid] = &[
    Ellipsoid { name: "WGS 84", proj_name: "WGS84", semi_major: 6378137.0, inverse_flattening: 298.257223563 },
    Ellipsoid { name: "GRS 1980", proj_name: "GRS80", semi_major: 6378137.0, inverse_flattening: 298.257222101 },
    Ellipsoid { name: "WGS 72", proj_name: "WGS72", semi_major: 6378135.0, inverse_flattening: 298.26 },
    Ellipsoid { name: "International 1924", proj_name: "intl", semi_major: 6378388.0, inverse_flattening: 297.0 },
    Ellipsoid { name: "Clarke 1866", proj_name: "clrk66", semi_major: 6378206.4, inverse_flattening: 294.978698213898 },
    Ellipsoid { name: "Bessel 1841", proj_name: "bessel", semi_major: 6377397.155, inverse_flattening: 299.1528128 },
    Ellipsoid { name: "Airy 1830", proj_name: "airy", semi_major: 6377563.396, inverse_flattening: 299.3249646 },
    Ellipsoid { name: "Krassowsky 1940", proj_name: "krass", semi_major: 6378245.0, inverse_flattening: 298.3 },
];

/// Datum shorthand -> ellipsoid name.
const DATUMS: &[(&str, &str)] = &[
    ("WGS84", "WGS84"),
    ("NAD83", "GRS80"),
    ("NAD27", "clrk66"),
    ("OSGB36", "airy"),
    ("potsdam", "bessel"),
];

impl Ellipsoid {
    pub fn by_proj_name(name: &str) -> Option<&'static Ellipsoid> {
        ELLIPSOIDS
            .iter()
            .find(|e| e.proj_name.eq_ignore_ascii_case(name))
    }

    /// Known ellipsoid with the same axes, within a millimetre.
    pub fn matching(semi_major: f64, inverse_flattening: f64) -> Option<&'static Ellipsoid> {
        ELLIPSOIDS.iter().find(|e| {
            (e.semi_major - semi_major).abs() < 1e-3
                && (e.inverse_flattening - inverse_flattening).abs() < 1e-6
        })
    }
}

impl Proj4 {
    /// Parse a definition such as `+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs`.
    pub fn parse(definition: &str) -> Result<Self> {
        let mut params = Vec::new();
        for token in definition.split_whitespace() {
            let token = token.strip_prefix('+').ok_or_else(|| {
                CrsError::parse(format!("PROJ.4 token '{token}' does not start with '+'"))
            })?;
            if token.is_empty() {
                return Err(CrsError::parse("empty PROJ.4 parameter"));
            }
            match token.split_once('=') {
                Some((key, value)) => params.push((key.to_string(), Some(value.to_string()))),
                None => params.push((token.to_string(), None)),
            }
        }

        let proj4 = Self { params };
        if proj4.proj_name().is_none() {
            return Err(CrsError::parse(format!(
                "PROJ.4 definition has no +proj: '{definition}'"
            )));
        }
        Ok(proj4)
    }

    /// Start an empty definition for `+proj=<name>`.
    pub fn builder(proj: &str) -> Self {
        Self {
            params: vec![("proj".to_string(), Some(proj.to_string()))],
        }
    }

    pub fn set(&mut self, key: &str, value: impl fmt::Display) {
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = Some(value),
            None => self.params.push((key.to_string(), Some(value))),
        }
    }

    pub fn flag(&mut self, key: &str) {
        if !self.has(key) {
            self.params.push((key.to_string(), None));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub fn has(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k == key)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn proj_name(&self) -> Option<&str> {
        self.get("proj")
    }

    pub fn is_geographic(&self) -> bool {
        matches!(
            self.proj_name(),
            Some("longlat") | Some("latlong") | Some("lonlat") | Some("latlon")
        )
    }

    /// Ellipsoid axes implied by `+a/+b/+rf/+R/+ellps/+datum`, defaulting to WGS84.
    pub fn ellipsoid_axes(&self) -> (f64, f64) {
        if let Some(r) = self.get_f64("R") {
            return (r, 0.0);
        }
        if let Some(a) = self.get_f64("a") {
            if let Some(rf) = self.get_f64("rf") {
                return (a, rf);
            }
            if let Some(b) = self.get_f64("b") {
                return if (a - b).abs() < f64::EPSILON {
                    (a, 0.0)
                } else {
                    (a, a / (a - b))
                };
            }
            return (a, 0.0);
        }
        let named = self.get("ellps").or_else(|| {
            self.get("datum").and_then(|datum| {
                DATUMS
                    .iter()
                    .find(|(d, _)| d.eq_ignore_ascii_case(datum))
                    .map(|(_, e)| *e)
            })
        });
        named
            .and_then(Ellipsoid::by_proj_name)
            .map(|e| (e.semi_major, e.inverse_flattening))
            .unwrap_or((ELLIPSOIDS[0].semi_major, ELLIPSOIDS[0].inverse_flattening))
    }

    /// `+proj=utm` rewritten as the transverse mercator it stands for.
    ///
    /// Returns `None` for other projections and for a missing or out of range
    /// zone.
    pub fn expand_utm(&self) -> Option<Proj4> {
        if self.proj_name() != Some("utm") {
            return None;
        }
        let zone = self.get_f64("zone").filter(|z| (1.0..=60.0).contains(z))?;

        let mut tmerc = Proj4::builder("tmerc");
        tmerc.set("lat_0", 0);
        tmerc.set("lon_0", zone.trunc() * 6.0 - 183.0);
        tmerc.set("k", 0.9996);
        tmerc.set("x_0", 500000);
        tmerc.set("y_0", if self.has("south") { 10000000 } else { 0 });
        for (key, value) in self.params() {
            if matches!(
                key,
                "ellps" | "datum" | "a" | "b" | "rf" | "R" | "towgs84" | "units" | "to_meter"
            ) {
                match value {
                    Some(v) => tmerc.set(key, v),
                    None => tmerc.flag(key),
                }
            }
        }
        Some(tmerc)
    }

    /// Canonical form used for metadata-insensitive equality.
    ///
    /// UTM is expanded, ellipsoid shorthands become axes, numbers are
    /// re-rendered so `0` and `0.0` agree, and cosmetic flags are dropped.
    pub fn normalized(&self) -> BTreeMap<String, String> {
        if let Some(tmerc) = self.expand_utm() {
            return tmerc.normalized();
        }
        let mut out = BTreeMap::new();
        for (key, value) in &self.params {
            let key = key.as_str();
            if COSMETIC_KEYS.contains(&key)
                || matches!(key, "ellps" | "datum" | "a" | "b" | "rf" | "R")
            {
                continue;
            }
            if key == "units" && value.as_deref() == Some("m") {
                continue;
            }
            if is_default_value(key, value.as_deref()) {
                continue;
            }
            if key == "towgs84" && value.as_deref().map(is_zero_list).unwrap_or(false) {
                continue;
            }
            let value = value.as_deref().map(normalize_number).unwrap_or_default();
            out.insert(key.to_string(), value);
        }
        let (a, rf) = self.ellipsoid_axes();
        out.insert("a".to_string(), format!("{a}"));
        out.insert("rf".to_string(), format!("{:.6}", rf));
        out
    }

    /// Same geometry as `other`, ignoring metadata.
    pub fn equivalent(&self, other: &Proj4) -> bool {
        self.normalized() == other.normalized()
    }
}

/// PROJ defaults: origins and offsets are 0, scale factors are 1.
fn is_default_value(key: &str, value: Option<&str>) -> bool {
    let Some(n) = value.and_then(|v| v.parse::<f64>().ok()) else {
        return false;
    };
    match key {
        "lat_0" | "lon_0" | "x_0" | "y_0" => n == 0.0,
        "k" | "k_0" => n == 1.0,
        _ => false,
    }
}

fn normalize_number(value: &str) -> String {
    match value.parse::<f64>() {
        Ok(n) => format!("{n}"),
        Err(_) => value.to_string(),
    }
}

fn is_zero_list(value: &str) -> bool {
    value
        .split(',')
        .all(|v| v.trim().parse::<f64>().map(|n| n == 0.0).unwrap_or(false))
}

impl fmt::Display for Proj4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match value {
                Some(v) => write!(f, "+{key}={v}")?,
                None => write!(f, "+{key}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let def = "+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs";
        let proj4 = Proj4::parse(def).unwrap();
        assert_eq!(proj4.proj_name(), Some("utm"));
        assert_eq!(proj4.get_f64("zone"), Some(33.0));
        assert!(proj4.has("no_defs"));
        assert_eq!(proj4.to_string(), def);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Proj4::parse("proj=longlat").is_err());
        assert!(Proj4::parse("+datum=WGS84").is_err());
        assert!(Proj4::parse("+").is_err());
    }

    #[test]
    fn test_equivalence_ignores_spelling() {
        let a = Proj4::parse("+proj=longlat +datum=WGS84 +no_defs").unwrap();
        let b = Proj4::parse("+proj=longlat +a=6378137 +rf=298.257223563 +towgs84=0,0,0").unwrap();
        let c = Proj4::parse("+proj=longlat +ellps=intl").unwrap();
        assert!(a.equivalent(&b));
        assert!(!a.equivalent(&c));
    }

    #[test]
    fn test_equivalence_numbers() {
        let a = Proj4::parse("+proj=tmerc +lat_0=0 +lon_0=9 +k=0.9996 +x_0=500000").unwrap();
        let b = Proj4::parse("+proj=tmerc +lat_0=0.0 +lon_0=9.0 +k=0.99960 +x_0=500000.0 +units=m").unwrap();
        assert!(a.equivalent(&b));
    }

    #[test]
    fn test_utm_matches_tmerc() {
        let utm = Proj4::parse("+proj=utm +zone=32 +south +ellps=GRS80 +units=m +no_defs").unwrap();
        let tmerc = Proj4::parse(
            "+proj=tmerc +lat_0=0 +lon_0=9 +k=0.9996 +x_0=500000 +y_0=10000000 +ellps=GRS80",
        )
        .unwrap();
        assert!(utm.equivalent(&tmerc));
        assert!(Proj4::parse("+proj=utm +zone=61").unwrap().expand_utm().is_none());
    }

    #[test]
    fn test_sphere_axes() {
        let merc = Proj4::parse("+proj=merc +a=6378137 +b=6378137 +lat_ts=0").unwrap();
        assert_eq!(merc.ellipsoid_axes(), (6378137.0, 0.0));
    }
}
