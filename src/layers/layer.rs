//! Map layers
//!
//! A `Layer` carries the attributes every layer has (id, name, CRS, validity)
//! and a tagged payload that is either vector or raster data.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::crs::Crs;
use super::extent::Extent;
use super::raster::RasterLayer;
use super::vector::VectorLayer;

/// Layer kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Vector,
    Raster,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Vector => "vector",
            LayerKind::Raster => "raster",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific layer content
#[derive(Debug, Clone)]
pub enum LayerData {
    Vector(VectorLayer),
    Raster(RasterLayer),
}

/// A named geographic dataset registered in a project
#[derive(Debug, Clone)]
pub struct Layer {
    id: String,
    name: String,
    crs: Crs,
    valid: bool,
    load_error: Option<String>,
    data: LayerData,
}

impl Layer {
    /// A valid vector layer with a freshly generated id
    pub fn vector(name: &str, crs: Crs, data: VectorLayer) -> Self {
        Self::with_id(generate_layer_id(name), name, crs, LayerData::Vector(data))
    }

    /// A valid raster layer with a freshly generated id
    pub fn raster(name: &str, crs: Crs, data: RasterLayer) -> Self {
        Self::with_id(generate_layer_id(name), name, crs, LayerData::Raster(data))
    }

    /// A valid layer with a caller-chosen id
    pub fn with_id(id: impl Into<String>, name: &str, crs: Crs, data: LayerData) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            crs,
            valid: true,
            load_error: None,
            data,
        }
    }

    /// A layer whose source could not be loaded
    pub fn invalid(kind: LayerKind, name: &str, source: &Path, reason: impl Into<String>) -> Self {
        let data = match kind {
            LayerKind::Vector => LayerData::Vector(VectorLayer::empty(source)),
            LayerKind::Raster => LayerData::Raster(RasterLayer::unreadable(source)),
        };
        Self {
            id: generate_layer_id(name),
            name: name.to_string(),
            crs: Crs::unknown(),
            valid: false,
            load_error: Some(reason.into()),
            data,
        }
    }

    /// Replace the id; used when restoring layers from a saved project
    pub fn into_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Keep a saved CRS when the source itself cannot supply one
    pub fn or_crs(mut self, crs: Crs) -> Self {
        if !self.crs.is_known() {
            self.crs = crs;
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Validity as determined when the layer was loaded
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn kind(&self) -> LayerKind {
        match self.data {
            LayerData::Vector(_) => LayerKind::Vector,
            LayerData::Raster(_) => LayerKind::Raster,
        }
    }

    pub fn data(&self) -> &LayerData {
        &self.data
    }

    pub fn source(&self) -> &Path {
        match &self.data {
            LayerData::Vector(v) => v.source(),
            LayerData::Raster(r) => r.source(),
        }
    }

    pub fn as_vector(&self) -> Option<&VectorLayer> {
        match &self.data {
            LayerData::Vector(v) => Some(v),
            LayerData::Raster(_) => None,
        }
    }

    pub fn as_vector_mut(&mut self) -> Option<&mut VectorLayer> {
        match &mut self.data {
            LayerData::Vector(v) => Some(v),
            LayerData::Raster(_) => None,
        }
    }

    pub fn as_raster(&self) -> Option<&RasterLayer> {
        match &self.data {
            LayerData::Raster(r) => Some(r),
            LayerData::Vector(_) => None,
        }
    }

    /// Bounding box of the layer content; `None` for invalid layers
    pub fn extent(&self) -> Option<Extent> {
        if !self.valid {
            return None;
        }
        Some(match &self.data {
            LayerData::Vector(v) => v.extent(),
            LayerData::Raster(r) => r.extent(),
        })
    }

    pub fn summary(&self) -> LayerSummary {
        LayerSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind(),
            valid: self.valid,
            crs: self.crs.to_string(),
        }
    }
}

/// Snapshot of one layer for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub id: String,
    pub name: String,
    pub kind: LayerKind,
    pub valid: bool,
    /// Authority id, or `Unknown`
    pub crs: String,
}

/// `<name>_<uuid>` with the name reduced to identifier characters
pub fn generate_layer_id(name: &str) -> String {
    let mut stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if stem.is_empty() {
        stem.push_str("layer");
    }
    format!("{}_{}", stem, Uuid::new_v4().simple())
}
