//! GeoJSON and GeoJSON text sequence drivers

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use ::geojson::feature::Id;
use ::geojson::{FeatureCollection, GeoJson, JsonObject};
use serde_json::{json, Value};
use tracing::debug;

use super::{VectorDriver, VectorSource};
use crate::error::{LayerError, Result};
use crate::layers::{infer_fields, Crs, Feature, FieldValue, VectorLayer};

/// RFC 7946 GeoJSON files holding a FeatureCollection
pub struct GeoJsonDriver;

/// Newline-delimited GeoJSON features (RFC 8142 style, RS separator optional)
pub struct GeoJsonSeqDriver;

impl VectorDriver for GeoJsonDriver {
    fn name(&self) -> &'static str {
        "GeoJSON"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["geojson", "json"]
    }

    fn read(&self, path: &Path) -> Result<VectorSource> {
        let text = fs::read_to_string(path)?;
        let geojson: GeoJson = text.parse()?;

        let (raw, crs) = match geojson {
            GeoJson::FeatureCollection(fc) => {
                let crs = fc.foreign_members.as_ref().and_then(legacy_crs);
                (fc.features, crs)
            }
            GeoJson::Feature(f) => (vec![f], None),
            GeoJson::Geometry(g) => (vec![::geojson::Feature::from(g)], None),
        };

        let features = convert_features(raw)?;
        debug!(path = %path.display(), count = features.len(), "read GeoJSON");

        Ok(VectorSource {
            fields: infer_fields(&features),
            features,
            crs,
        })
    }

    fn write(&self, layer: &VectorLayer, crs: &Crs, path: &Path) -> Result<()> {
        let features = layer
            .features()
            .iter()
            .map(|f| to_geojson_feature(f, &layer.field_names()))
            .collect();

        let foreign_members = legacy_crs_member(crs).map(|member| {
            let mut obj = JsonObject::new();
            obj.insert("crs".to_string(), member);
            obj
        });

        let collection = FeatureCollection {
            bbox: None,
            features,
            foreign_members,
        };

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &collection)?;
        Ok(())
    }
}

impl VectorDriver for GeoJsonSeqDriver {
    fn name(&self) -> &'static str {
        "GeoJSONSeq"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["geojsonl", "geojsons"]
    }

    fn read(&self, path: &Path) -> Result<VectorSource> {
        let text = fs::read_to_string(path)?;
        let mut raw = Vec::new();

        for line in text.lines() {
            let line = line.trim_start_matches('\u{1e}').trim();
            if line.is_empty() {
                continue;
            }
            raw.push(line.parse::<::geojson::Feature>()?);
        }

        let features = convert_features(raw)?;
        debug!(path = %path.display(), count = features.len(), "read GeoJSONSeq");

        Ok(VectorSource {
            fields: infer_fields(&features),
            features,
            crs: None,
        })
    }

    fn write(&self, layer: &VectorLayer, _crs: &Crs, path: &Path) -> Result<()> {
        let names = layer.field_names();
        let mut writer = BufWriter::new(File::create(path)?);
        for feature in layer.features() {
            serde_json::to_writer(&mut writer, &to_geojson_feature(feature, &names))?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Convert parsed features, keeping numeric ids when they are unique
fn convert_features(raw: Vec<::geojson::Feature>) -> Result<Vec<Feature>> {
    let numeric_ids: Vec<Option<i64>> = raw
        .iter()
        .map(|f| match &f.id {
            Some(Id::Number(n)) => n.as_i64(),
            _ => None,
        })
        .collect();

    let mut seen = HashSet::new();
    let use_file_ids = numeric_ids
        .iter()
        .all(|id| id.map(|id| seen.insert(id)).unwrap_or(false));

    raw.into_iter()
        .zip(numeric_ids)
        .enumerate()
        .map(|(index, (f, file_id))| {
            let id = match file_id {
                Some(id) if use_file_ids => id,
                _ => index as i64,
            };
            from_geojson_feature(f, id)
        })
        .collect()
}

fn from_geojson_feature(f: ::geojson::Feature, id: i64) -> Result<Feature> {
    let geometry = f
        .geometry
        .map(geo_types::Geometry::<f64>::try_from)
        .transpose()
        .map_err(|e| LayerError::CodecError {
            reason: format!("feature {}: {}", id, e),
        })?;

    let attributes = f
        .properties
        .unwrap_or_default()
        .iter()
        .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
        .collect();

    Ok(Feature {
        id,
        geometry,
        attributes,
    })
}

fn to_geojson_feature(feature: &Feature, field_names: &[String]) -> ::geojson::Feature {
    let mut properties = JsonObject::new();
    for name in field_names {
        let value = feature
            .attribute(name)
            .map(FieldValue::to_json)
            .unwrap_or(Value::Null);
        properties.insert(name.clone(), value);
    }

    ::geojson::Feature {
        bbox: None,
        geometry: feature
            .geometry
            .as_ref()
            .map(|g| ::geojson::Geometry::new(::geojson::Value::from(g))),
        id: Some(Id::Number(feature.id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// The pre-RFC 7946 `crs` member: `{"type": "name", "properties": {"name": ...}}`
fn legacy_crs(members: &JsonObject) -> Option<Crs> {
    let name = members
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;
    Crs::parse(name)
}

fn legacy_crs_member(crs: &Crs) -> Option<Value> {
    if !crs.is_known() || *crs == Crs::wgs84() {
        return None;
    }
    let urn = crs.to_urn()?;
    Some(json!({ "type": "name", "properties": { "name": urn } }))
}
