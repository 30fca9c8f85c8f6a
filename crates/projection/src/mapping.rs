//! Translation between WKT1 coordinate systems and PROJ.4 definitions.
//!
//! The method table is shared by both directions so a definition that goes
//! WKT -> PROJ.4 -> WKT lands on the same projection and parameter names.

use crate::error::{CrsError, Result};
use crate::proj4::{Ellipsoid, Proj4};
use crate::wkt::{WktNode, WktValue};

/// Value of one degree in radians, as WKT writes it.
const DEGREE: f64 = 0.0174532925199433;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Special {
    None,
    /// Forces a sphere with the datum's semi-major axis (Web Mercator).
    Spherical,
    /// Polar stereographic: `lat_0` is the pole on the side of `lat_ts`.
    Polar,
}

struct MethodMapping {
    /// WKT names; the first one is used when writing.
    wkt_names: &'static [&'static str],
    proj: &'static str,
    /// (accepted WKT parameter names, PROJ.4 key)
    params: &'static [(&'static [&'static str], &'static str)],
    special: Special,
}

const FALSE_EASTING: (&[&str], &str) = (&["false_easting"], "x_0");
const FALSE_NORTHING: (&[&str], &str) = (&["false_northing"], "y_0");

const METHODS: &[MethodMapping] = &[
    MethodMapping {
        wkt_names: &["Transverse_Mercator", "Gauss_Kruger"],
        proj: "tmerc",
        params: &[
            (&["latitude_of_origin"], "lat_0"),
            (&["central_meridian"], "lon_0"),
            (&["scale_factor"], "k"),
            FALSE_EASTING,
            FALSE_NORTHING,
        ],
        special: Special::None,
    },
    MethodMapping {
        wkt_names: &[
            "Popular_Visualisation_Pseudo_Mercator",
            "Mercator_Auxiliary_Sphere",
            "Google_Maps_Global_Mercator",
        ],
        proj: "merc",
        params: &[
            (&["central_meridian"], "lon_0"),
            (&["scale_factor"], "k"),
            FALSE_EASTING,
            FALSE_NORTHING,
        ],
        special: Special::Spherical,
    },
    MethodMapping {
        wkt_names: &["Mercator_1SP", "Mercator", "Mercator_2SP"],
        proj: "merc",
        params: &[
            (&["central_meridian"], "lon_0"),
            (&["scale_factor"], "k"),
            (&["standard_parallel_1"], "lat_ts"),
            FALSE_EASTING,
            FALSE_NORTHING,
        ],
        special: Special::None,
    },
    MethodMapping {
        wkt_names: &["Lambert_Conformal_Conic_2SP", "Lambert_Conformal_Conic"],
        proj: "lcc",
        params: &[
            (&["standard_parallel_1"], "lat_1"),
            (&["standard_parallel_2"], "lat_2"),
            (&["latitude_of_origin"], "lat_0"),
            (&["central_meridian"], "lon_0"),
            (&["scale_factor"], "k_0"),
            FALSE_EASTING,
            FALSE_NORTHING,
        ],
        special: Special::None,
    },
    MethodMapping {
        wkt_names: &["Polar_Stereographic"],
        proj: "stere",
        params: &[
            (&["latitude_of_origin"], "lat_ts"),
            (&["central_meridian"], "lon_0"),
            (&["scale_factor"], "k"),
            FALSE_EASTING,
            FALSE_NORTHING,
        ],
        special: Special::Polar,
    },
    MethodMapping {
        wkt_names: &["Lambert_Azimuthal_Equal_Area"],
        proj: "laea",
        params: &[
            (&["latitude_of_center", "latitude_of_origin"], "lat_0"),
            (&["longitude_of_center", "central_meridian"], "lon_0"),
            FALSE_EASTING,
            FALSE_NORTHING,
        ],
        special: Special::None,
    },
];

fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_lowercase() })
        .collect()
}

fn method_by_wkt_name(name: &str) -> Option<&'static MethodMapping> {
    let wanted = normalize_name(name);
    METHODS
        .iter()
        .find(|m| m.wkt_names.iter().any(|n| normalize_name(n) == wanted))
}

// ============================================================================
// WKT -> PROJ.4
// ============================================================================

/// Derive a PROJ.4 definition from a parsed GEOGCS or PROJCS node.
pub fn wkt_to_proj4(root: &WktNode) -> Result<Proj4> {
    if let Some(proj4) = proj4_extension(root)? {
        return Ok(proj4);
    }

    if root.is("GEOGCS") {
        let mut proj4 = Proj4::builder("longlat");
        apply_geogcs(root, &mut proj4, false)?;
        proj4.flag("no_defs");
        Ok(proj4)
    } else if root.is("PROJCS") {
        projcs_to_proj4(root)
    } else {
        Err(CrsError::parse(format!(
            "unsupported WKT root element {}; expected GEOGCS or PROJCS",
            root.keyword
        )))
    }
}

fn proj4_extension(root: &WktNode) -> Result<Option<Proj4>> {
    let extension = root
        .children("EXTENSION")
        .find(|ext| ext.name().map(|n| n.eq_ignore_ascii_case("PROJ4")).unwrap_or(false));

    match extension {
        Some(ext) => {
            let definition = ext
                .args
                .iter()
                .filter_map(|arg| match arg {
                    WktValue::Text(s) => Some(s.as_str()),
                    _ => None,
                })
                .nth(1)
                .ok_or_else(|| CrsError::parse("EXTENSION[\"PROJ4\"] without a definition"))?;
            Proj4::parse(definition).map(Some)
        }
        None => Ok(None),
    }
}

fn projcs_to_proj4(root: &WktNode) -> Result<Proj4> {
    let geogcs = root
        .child("GEOGCS")
        .ok_or_else(|| CrsError::parse("PROJCS without a GEOGCS"))?;
    let method_name = root
        .child("PROJECTION")
        .and_then(WktNode::name)
        .ok_or_else(|| CrsError::parse("PROJCS without a PROJECTION"))?;
    let method = method_by_wkt_name(method_name).ok_or_else(|| {
        CrsError::parse(format!("unsupported projection method '{method_name}'"))
    })?;

    let parameters: Vec<(String, f64)> = root
        .children("PARAMETER")
        .filter_map(|p| {
            let name = normalize_name(p.name()?);
            let value = *p.numbers().first()?;
            Some((name, value))
        })
        .collect();

    let mut proj4 = Proj4::builder(method.proj);
    for &(names, key) in method.params {
        if let Some(value) = find_parameter(&parameters, names) {
            proj4.set(key, value);
        }
    }

    match method.special {
        Special::Polar => {
            let lat_ts = find_parameter(&parameters, &["latitude_of_origin"]).unwrap_or(90.0);
            proj4.set("lat_0", if lat_ts < 0.0 { -90.0 } else { 90.0 });
        }
        Special::Spherical => {
            // Web Mercator: ellipsoidal datum, spherical math
            let (a, _) = spheroid_axes(geogcs)?;
            proj4.set("a", a);
            proj4.set("b", a);
            proj4.set("nadgrids", "@null");
        }
        Special::None => {}
    }

    if method.special != Special::Spherical {
        apply_geogcs(geogcs, &mut proj4, true)?;
    }

    if let Some(unit) = root.child("UNIT") {
        let factor = unit.numbers().first().copied().unwrap_or(1.0);
        if (factor - 1.0).abs() < 1e-12 {
            proj4.set("units", "m");
        } else {
            proj4.set("to_meter", factor);
        }
    } else {
        proj4.set("units", "m");
    }

    proj4.flag("no_defs");
    Ok(proj4)
}

fn find_parameter(parameters: &[(String, f64)], names: &[&str]) -> Option<f64> {
    names.iter().find_map(|wanted| {
        parameters
            .iter()
            .find(|(name, _)| name == wanted)
            .map(|(_, v)| *v)
    })
}

fn spheroid_axes(geogcs: &WktNode) -> Result<(f64, f64)> {
    let spheroid = geogcs
        .child("DATUM")
        .and_then(|d| d.child("SPHEROID"))
        .ok_or_else(|| CrsError::parse("GEOGCS without DATUM/SPHEROID"))?;
    match spheroid.numbers().as_slice() {
        [a, rf, ..] if *a > 0.0 => Ok((*a, *rf)),
        _ => Err(CrsError::parse("SPHEROID needs a semi-major axis and inverse flattening")),
    }
}

fn apply_geogcs(geogcs: &WktNode, proj4: &mut Proj4, projected: bool) -> Result<()> {
    if !projected {
        if let Some(unit) = geogcs.child("UNIT") {
            let factor = unit.numbers().first().copied().unwrap_or(DEGREE);
            if (factor - DEGREE).abs() > 1e-10 {
                return Err(CrsError::parse(format!(
                    "unsupported angular unit '{}'",
                    unit.name().unwrap_or("?")
                )));
            }
        }
    }

    let datum = geogcs
        .child("DATUM")
        .ok_or_else(|| CrsError::parse("GEOGCS without DATUM"))?;
    let (a, rf) = spheroid_axes(geogcs)?;
    let towgs84 = datum.child("TOWGS84").map(|t| {
        t.numbers()
            .iter()
            .map(|n| format!("{n}"))
            .collect::<Vec<_>>()
            .join(",")
    });

    let datum_name = datum.name().map(normalize_name).unwrap_or_default();
    let is_wgs84_datum = matches!(datum_name.as_str(), "wgs_1984" | "d_wgs_1984" | "wgs84")
        && Ellipsoid::matching(a, rf).map(|e| e.proj_name) == Some("WGS84");

    if is_wgs84_datum && towgs84.is_none() {
        proj4.set("datum", "WGS84");
    } else {
        match Ellipsoid::matching(a, rf) {
            Some(ellipsoid) => proj4.set("ellps", ellipsoid.proj_name),
            None if rf == 0.0 => {
                proj4.set("a", a);
                proj4.set("b", a);
            }
            None => {
                proj4.set("a", a);
                proj4.set("rf", rf);
            }
        }
        if let Some(towgs84) = towgs84 {
            proj4.set("towgs84", towgs84);
        }
    }

    if let Some(primem) = geogcs.child("PRIMEM") {
        let offset = primem.numbers().first().copied().unwrap_or(0.0);
        if offset != 0.0 {
            proj4.set("pm", offset);
        }
    }
    Ok(())
}

// ============================================================================
// PROJ.4 -> WKT
// ============================================================================

/// Build a WKT1 tree for a PROJ.4 definition.
///
/// `authority` is attached to the root when the definition came from a
/// registry entry.
pub fn proj4_to_wkt(name: &str, proj4: &Proj4, authority: Option<(&str, &str)>) -> Result<WktNode> {
    let mut root = if proj4.is_geographic() {
        geogcs_node(name, proj4)
    } else {
        projcs_node(name, proj4)?
    };

    if let Some((auth, code)) = authority {
        root = root.with_node(
            WktNode::new("AUTHORITY")
                .with_text(auth)
                .with_text(code),
        );
    }
    Ok(root)
}

fn geogcs_node(name: &str, proj4: &Proj4) -> WktNode {
    let (a, rf) = proj4.ellipsoid_axes();
    let ellipsoid = Ellipsoid::matching(a, rf);
    let spheroid_name = ellipsoid.map(|e| e.name).unwrap_or("unnamed");
    let datum_name = match (proj4.get("datum"), ellipsoid) {
        (Some(datum), _) if datum.eq_ignore_ascii_case("WGS84") => "WGS_1984".to_string(),
        (Some(datum), _) => datum.to_string(),
        (None, Some(e)) if e.proj_name == "WGS84" => "WGS_1984".to_string(),
        (None, Some(e)) => format!("D_{}", e.proj_name),
        (None, None) => "unknown".to_string(),
    };

    let mut datum = WktNode::new("DATUM").with_text(datum_name).with_node(
        WktNode::new("SPHEROID")
            .with_text(spheroid_name)
            .with_number(a)
            .with_number(rf),
    );
    if let Some(towgs84) = proj4.get("towgs84") {
        let mut node = WktNode::new("TOWGS84");
        for value in towgs84.split(',').filter_map(|v| v.trim().parse::<f64>().ok()) {
            node = node.with_number(value);
        }
        datum = datum.with_node(node);
    }

    let geog_name = if proj4.is_geographic() { name } else { "unnamed" };
    WktNode::new("GEOGCS")
        .with_text(geog_name)
        .with_node(datum)
        .with_node(
            WktNode::new("PRIMEM")
                .with_text("Greenwich")
                .with_number(proj4.get_f64("pm").unwrap_or(0.0)),
        )
        .with_node(WktNode::new("UNIT").with_text("degree").with_number(DEGREE))
}

fn projcs_node(name: &str, proj4: &Proj4) -> Result<WktNode> {
    let proj_name = proj4.proj_name().unwrap_or_default();

    // UTM is transverse mercator with fixed parameters
    let expanded;
    let proj4 = if proj_name == "utm" {
        expanded = proj4
            .expand_utm()
            .ok_or_else(|| CrsError::parse("+proj=utm needs +zone between 1 and 60"))?;
        &expanded
    } else {
        proj4
    };
    let proj_name = proj4.proj_name().unwrap_or_default();

    let is_spherical_merc = proj_name == "merc"
        && proj4.get("nadgrids") == Some("@null")
        && proj4.ellipsoid_axes().1 == 0.0;
    let method = METHODS
        .iter()
        .find(|m| {
            m.proj == proj_name && ((m.special == Special::Spherical) == is_spherical_merc)
        })
        .ok_or_else(|| {
            CrsError::parse(format!("cannot express +proj={proj_name} as WKT"))
        })?;

    let geogcs = if method.special == Special::Spherical {
        let wgs84 = Proj4::parse("+proj=longlat +datum=WGS84")?;
        geogcs_node("WGS 84", &wgs84)
    } else {
        geogcs_node(name, proj4)
    };

    let mut root = WktNode::new("PROJCS")
        .with_text(name)
        .with_node(geogcs)
        .with_node(WktNode::new("PROJECTION").with_text(method.wkt_names[0]));

    let mut written: Vec<&str> = Vec::new();
    for &(names, key) in method.params {
        let wkt_name = names[0];
        if written.contains(&wkt_name) {
            continue;
        }
        let default = match key {
            "k" | "k_0" => 1.0,
            _ => 0.0,
        };
        let value = proj4.get_f64(key).unwrap_or(default);
        root = root.with_node(
            WktNode::new("PARAMETER")
                .with_text(wkt_name)
                .with_number(value),
        );
        written.push(wkt_name);
    }

    let to_meter = proj4.get_f64("to_meter").unwrap_or(1.0);
    let unit_name = if to_meter == 1.0 { "metre" } else { "unknown" };
    Ok(root.with_node(WktNode::new("UNIT").with_text(unit_name).with_number(to_meter)))
}
