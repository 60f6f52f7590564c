//! Layer Model Module
//!
//! Vector and raster layers and the value types they are built from.

mod crs;
mod extent;
mod layer;
mod raster;
mod vector;

pub use crs::{Crs, DEFAULT_CRS};
pub use extent::Extent;
pub use layer::{generate_layer_id, Layer, LayerData, LayerKind, LayerSummary};
pub use raster::{RasterGrid, RasterLayer};
pub use vector::{infer_fields, Feature, FeatureId, Field, FieldType, FieldValue, VectorLayer};
