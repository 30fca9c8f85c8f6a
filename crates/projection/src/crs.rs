//! The CRS handle shared by every raster.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use proj4rs::proj::Proj;

use crate::code::CrsCode;
use crate::error::{CrsError, Result};
use crate::mapping;
use crate::proj4::Proj4;
use crate::wkt::{self, WktNode};

/// Whether coordinates are angular (lon/lat degrees) or planar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrsKind {
    Geographic,
    Projected,
}

/// Map projection of a projected CRS: the PROJ.4 method name and its numeric
/// parameters with defaults omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInfo {
    pub method: String,
    pub parameters: BTreeMap<String, f64>,
}

impl ProjectionInfo {
    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }
}

#[derive(Debug)]
struct CrsDefinition {
    name: String,
    identifier: Option<CrsCode>,
    wkt: String,
    proj4: Proj4,
    kind: CrsKind,
}

/// Immutable, cheaply clonable coordinate reference system.
///
/// Every handle carries both a WKT representation (for serialization) and a
/// PROJ.4 definition (for coordinate math). Two handles compare equal when
/// both have identifiers and the identifiers match, or otherwise when their
/// PROJ.4 definitions describe the same geometry.
#[derive(Clone)]
pub struct Crs {
    inner: Arc<CrsDefinition>,
}

impl Crs {
    /// Build a CRS from WKT1 text. The identifier is taken from the root
    /// `AUTHORITY` node when one is present.
    pub fn from_wkt(text: &str) -> Result<Self> {
        let root = wkt::parse(text)?;
        let identifier = root
            .authority()
            .map(|(authority, code)| CrsCode::new(authority, code));
        Self::from_wkt_node(identifier, &root, text.trim().to_string())
    }

    /// Build a CRS from a PROJ.4 definition.
    ///
    /// The WKT form is generated and keeps the original definition in an
    /// `EXTENSION["PROJ4", ...]` node so that it survives a WKT round trip.
    pub fn from_proj4(identifier: Option<CrsCode>, name: &str, definition: &str) -> Result<Self> {
        let proj4 = Proj4::parse(definition)?;
        let authority = identifier
            .as_ref()
            .map(|code| (code.authority(), code.code()));
        let root = mapping::proj4_to_wkt(name, &proj4, authority)?.with_node(
            WktNode::new("EXTENSION")
                .with_text("PROJ4")
                .with_text(proj4.to_string()),
        );
        Self::build(name.to_string(), identifier, root.to_string(), proj4)
    }

    /// Build a CRS for a registry entry whose value is either WKT or a
    /// PROJ.4 string (anything starting with `+`).
    pub fn from_definition(identifier: CrsCode, definition: &str) -> Result<Self> {
        let definition = definition.trim();
        if definition.starts_with('+') {
            let name = identifier.to_string();
            return Self::from_proj4(Some(identifier), &name, definition);
        }

        let mut root = wkt::parse(definition)?;
        if root.authority().is_none() {
            root = root.with_node(
                WktNode::new("AUTHORITY")
                    .with_text(identifier.authority())
                    .with_text(identifier.code()),
            );
        }
        let text = root.to_string();
        Self::from_wkt_node(Some(identifier), &root, text)
    }

    /// Built-in EPSG definition.
    pub fn from_epsg(code: u16) -> Result<Self> {
        let def = crs_definitions::from_code(code)
            .ok_or_else(|| CrsError::lookup(format!("EPSG:{code}")))?;
        let proj4 = Proj4::parse(def.proj4)?;
        let name = wkt::parse(def.wkt)
            .ok()
            .and_then(|root| root.name().map(str::to_string))
            .unwrap_or_else(|| format!("EPSG:{code}"));
        Self::build(
            name,
            Some(CrsCode::epsg(u32::from(code))),
            def.wkt.to_string(),
            proj4,
        )
    }

    fn from_wkt_node(identifier: Option<CrsCode>, root: &WktNode, text: String) -> Result<Self> {
        let proj4 = mapping::wkt_to_proj4(root)?;
        let name = root.name().unwrap_or("unnamed").to_string();
        Self::build(name, identifier, text, proj4)
    }

    fn build(name: String, identifier: Option<CrsCode>, wkt: String, proj4: Proj4) -> Result<Self> {
        // reject anything the projection engine cannot instantiate up front
        Proj::from_proj_string(&proj4.to_string()).map_err(|e| {
            CrsError::parse(format!("unsupported PROJ.4 definition '{proj4}': {e:?}"))
        })?;

        let kind = if proj4.is_geographic() {
            CrsKind::Geographic
        } else {
            CrsKind::Projected
        };
        Ok(Self {
            inner: Arc::new(CrsDefinition {
                name,
                identifier,
                wkt,
                proj4,
                kind,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn identifier(&self) -> Option<&CrsCode> {
        self.inner.identifier.as_ref()
    }

    pub fn wkt(&self) -> &str {
        &self.inner.wkt
    }

    pub fn proj4(&self) -> &Proj4 {
        &self.inner.proj4
    }

    pub fn kind(&self) -> CrsKind {
        self.inner.kind
    }

    pub fn is_geographic(&self) -> bool {
        self.inner.kind == CrsKind::Geographic
    }

    /// Projection descriptor; `None` for geographic systems.
    pub fn projection(&self) -> Option<ProjectionInfo> {
        if self.is_geographic() {
            return None;
        }
        let canonical = self.inner.proj4.expand_utm();
        let proj4 = canonical.as_ref().unwrap_or(&self.inner.proj4);
        let method = proj4.proj_name().unwrap_or_default().to_string();
        let parameters = proj4
            .normalized()
            .into_iter()
            .filter(|(key, _)| !matches!(key.as_str(), "proj" | "a" | "rf"))
            .filter_map(|(key, value)| value.parse::<f64>().ok().map(|v| (key, v)))
            .collect();
        Some(ProjectionInfo { method, parameters })
    }

    /// Same underlying definition (not just equal).
    pub fn ptr_eq(&self, other: &Crs) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.identifier(), other.identifier()) {
            (Some(a), Some(b)) => a == b,
            _ => self.proj4().equivalent(other.proj4()),
        }
    }
}

impl fmt::Debug for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crs")
            .field("name", &self.inner.name)
            .field("identifier", &self.inner.identifier)
            .field("proj4", &self.inner.proj4.to_string())
            .finish()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.identifier {
            Some(code) => write!(f, "{} ({code})", self.inner.name),
            None => f.write_str(&self.inner.name),
        }
    }
}
