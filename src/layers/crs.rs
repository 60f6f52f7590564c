//! Coordinate reference system identifiers
//!
//! Only the authority id is tracked. No transforms happen here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Authority id used when a source carries no CRS information at all
pub const DEFAULT_CRS: &str = "EPSG:4326";

/// Authority-qualified CRS identifier, e.g. `EPSG:4326`
///
/// An empty id means the CRS is unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Crs(String);

impl Crs {
    pub fn new(authid: impl Into<String>) -> Self {
        Self(authid.into())
    }

    /// The unknown CRS
    pub fn unknown() -> Self {
        Self(String::new())
    }

    /// WGS 84, the GeoJSON default
    pub fn wgs84() -> Self {
        Self(DEFAULT_CRS.to_string())
    }

    /// Normalize the CRS names found in the wild to `AUTH:CODE`
    ///
    /// Accepts `EPSG:3857`, `epsg:3857`, `urn:ogc:def:crs:EPSG::3857`,
    /// `urn:ogc:def:crs:EPSG:6.6:3857`, the OGC URL form
    /// `http://www.opengis.net/def/crs/EPSG/0/3857` and CRS84 in any of them.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let upper = name.to_uppercase();
        if upper.ends_with("OGC:1.3:CRS84") || upper == "CRS84" || upper == "OGC:CRS84" {
            return Some(Self::wgs84());
        }

        if let Some(rest) = upper.strip_prefix("URN:OGC:DEF:CRS:") {
            // AUTH:[version]:CODE
            let mut parts = rest.split(':');
            let authority = parts.next()?;
            let code = parts.last()?;
            return Self::from_parts(authority, code);
        }

        if let Some(start) = upper.find("/DEF/CRS/") {
            // AUTH/version/CODE
            let mut parts = upper[start + "/DEF/CRS/".len()..].split('/');
            let authority = parts.next()?;
            let code = parts.last()?;
            return Self::from_parts(authority, code);
        }

        let (authority, code) = upper.split_once(':')?;
        Self::from_parts(authority, code)
    }

    /// Pull the last `AUTHORITY["EPSG","NNNN"]` out of a WKT string
    pub fn from_wkt_authority(wkt: &str) -> Option<Self> {
        let start = wkt.rfind("AUTHORITY[")?;
        let inner = &wkt[start + "AUTHORITY[".len()..];
        let end = inner.find(']')?;
        let mut parts = inner[..end]
            .split(',')
            .map(|p| p.trim().trim_matches('"'));
        let authority = parts.next()?;
        let code = parts.next()?;
        Self::from_parts(authority, code)
    }

    fn from_parts(authority: &str, code: &str) -> Option<Self> {
        let authority = authority.trim();
        let code = code.trim();
        let is_token =
            |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric());
        if !is_token(authority) || !is_token(code) {
            return None;
        }
        let authority = authority.to_uppercase();
        if authority == "OGC" && code.eq_ignore_ascii_case("CRS84") {
            return Some(Self::wgs84());
        }
        Some(Self(format!("{}:{}", authority, code)))
    }

    /// Authority id, empty when unknown
    pub fn authid(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        !self.0.is_empty()
    }

    /// The urn form written into legacy GeoJSON `crs` members
    pub fn to_urn(&self) -> Option<String> {
        let (authority, code) = self.0.split_once(':')?;
        Some(format!("urn:ogc:def:crs:{}::{}", authority, code))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            f.write_str(&self.0)
        } else {
            f.write_str("Unknown")
        }
    }
}
