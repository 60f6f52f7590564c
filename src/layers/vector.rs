//! Vector layers
//!
//! Discrete features with a geometry and named attribute values, plus the
//! layer's runtime selection set.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use geo_types::Geometry;
use serde::{Deserialize, Serialize};

use super::extent::Extent;

/// Feature identifier, unique within one layer
pub type FeatureId = i64;

/// Attribute field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Boolean,
    Integer,
    Real,
    String,
    /// Arrays and objects
    Json,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Real => "real",
            FieldType::String => "string",
            FieldType::Json => "json",
        };
        f.write_str(s)
    }
}

/// One attribute field of a layer schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Json(serde_json::Value),
}

impl FieldValue {
    /// Convert a JSON property value
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::String(s.clone()),
            other => FieldValue::Json(other.clone()),
        }
    }

    /// Convert back to a JSON property value
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Real(r) => serde_json::Number::from_f64(*r)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Json(v) => v.clone(),
        }
    }

    /// Parse a command-line literal: integer, finite real, boolean, `null`, else string
    pub fn parse_literal(s: &str) -> Self {
        if s == "null" {
            FieldValue::Null
        } else if let Ok(i) = s.parse::<i64>() {
            FieldValue::Integer(i)
        } else if let Some(r) = s.parse::<f64>().ok().filter(|r| r.is_finite()) {
            FieldValue::Real(r)
        } else if let Ok(b) = s.parse::<bool>() {
            FieldValue::Bool(b)
        } else {
            FieldValue::String(s.to_string())
        }
    }

    /// The field type this value implies, `None` for null
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(_) => Some(FieldType::Boolean),
            FieldValue::Integer(_) => Some(FieldType::Integer),
            FieldValue::Real(_) => Some(FieldType::Real),
            FieldValue::String(_) => Some(FieldType::String),
            FieldValue::Json(_) => Some(FieldType::Json),
        }
    }

    /// Equality used by attribute filters
    ///
    /// Integers and reals compare numerically; other values must match exactly.
    pub fn matches(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Real(b))
            | (FieldValue::Real(b), FieldValue::Integer(a)) => integer_equals_real(*a, *b),
            _ => self == other,
        }
    }
}

/// Exact comparison; a real only equals an integer it represents without rounding
fn integer_equals_real(i: i64, r: f64) -> bool {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    r.fract() == 0.0 && r >= i64::MIN as f64 && r < i64::MAX as f64 && r as i64 == i
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("NULL"),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Real(r) => write!(f, "{}", r),
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Json(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(r: f64) -> Self {
        FieldValue::Real(r)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// One record of a vector layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry<f64>>,
    /// Attribute values in schema order
    pub attributes: Vec<(String, FieldValue)>,
}

impl Feature {
    pub fn new(id: FeatureId) -> Self {
        Self {
            id,
            geometry: None,
            attributes: Vec::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: impl Into<Geometry<f64>>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set_attribute(name, value.into());
        self
    }

    /// Value of a named attribute, `None` if the feature lacks it
    pub fn attribute(&self, name: &str) -> Option<&FieldValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn set_attribute(&mut self, name: &str, value: FieldValue) {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }
}

/// A vector layer
#[derive(Debug, Clone)]
pub struct VectorLayer {
    source: PathBuf,
    fields: Vec<Field>,
    features: Vec<Feature>,
    selection: BTreeSet<FeatureId>,
}

impl VectorLayer {
    pub fn new(source: impl Into<PathBuf>, fields: Vec<Field>, features: Vec<Feature>) -> Self {
        Self {
            source: source.into(),
            fields,
            features,
            selection: BTreeSet::new(),
        }
    }

    /// A vector layer with no schema and no features
    pub fn empty(source: impl Into<PathBuf>) -> Self {
        Self::new(source, Vec::new(), Vec::new())
    }

    /// Build a layer from features alone, inferring the schema
    pub fn from_features(source: impl Into<PathBuf>, features: Vec<Feature>) -> Self {
        let fields = infer_fields(&features);
        Self::new(source, fields, features)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Features in native order
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    /// Replace the selection with exactly `ids`
    pub fn select_by_ids(&mut self, ids: &[FeatureId]) {
        self.selection = ids.iter().copied().collect();
    }

    pub fn remove_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selected_ids(&self) -> Vec<FeatureId> {
        self.selection.iter().copied().collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Bounds of all geometries, the null rectangle when there are none
    pub fn extent(&self) -> Extent {
        Extent::of_geometries(self.features.iter().filter_map(|f| f.geometry.as_ref()))
            .unwrap_or_else(Extent::null)
    }
}

/// Schema from the union of attribute names, in first-seen order
///
/// A field's type comes from its first non-null value. Fields that are null
/// everywhere are typed as strings.
pub fn infer_fields(features: &[Feature]) -> Vec<Field> {
    let mut fields: Vec<(String, Option<FieldType>)> = Vec::new();

    for feature in features {
        for (name, value) in &feature.attributes {
            match fields.iter_mut().find(|(n, _)| n == name) {
                Some((_, ty @ None)) => *ty = value.field_type(),
                Some(_) => {}
                None => fields.push((name.clone(), value.field_type())),
            }
        }
    }

    fields
        .into_iter()
        .map(|(name, ty)| Field::new(name, ty.unwrap_or(FieldType::String)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::point;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn sample_features() -> Vec<Feature> {
        vec![
            Feature::new(0)
                .with_geometry(point!(x: 1.0, y: 1.0))
                .with_attribute("name", "Main St")
                .with_attribute("lanes", 2i64),
            Feature::new(1)
                .with_geometry(point!(x: 3.0, y: -2.0))
                .with_attribute("name", "Side St")
                .with_attribute("speed", 30.5),
        ]
    }

    #[test]
    fn test_infer_fields_first_seen_order() {
        let layer = VectorLayer::from_features("roads.geojson", sample_features());
        assert_eq!(
            layer.fields(),
            &[
                Field::new("name", FieldType::String),
                Field::new("lanes", FieldType::Integer),
                Field::new("speed", FieldType::Real),
            ]
        );
    }

    #[test]
    fn test_null_then_typed_value() {
        let features = vec![
            Feature::new(0).with_attribute("code", FieldValue::Null),
            Feature::new(1).with_attribute("code", 7i64),
        ];
        let fields = infer_fields(&features);
        assert_eq!(fields, vec![Field::new("code", FieldType::Integer)]);
    }

    #[test]
    fn test_selection_replace_and_clear() {
        let mut layer = VectorLayer::from_features("roads.geojson", sample_features());
        layer.select_by_ids(&[1, 0, 1]);
        assert_eq!(layer.selected_ids(), vec![0, 1]);

        layer.select_by_ids(&[1]);
        assert_eq!(layer.selected_ids(), vec![1]);

        layer.remove_selection();
        assert_eq!(layer.selected_count(), 0);
    }

    #[test]
    fn test_extent() {
        let layer = VectorLayer::from_features("roads.geojson", sample_features());
        assert_eq!(layer.extent(), Extent::new(1.0, -2.0, 3.0, 1.0));
        assert!(VectorLayer::empty("none.geojson").extent().is_null());
    }

    #[test]
    fn test_value_matching() {
        assert!(FieldValue::Integer(3).matches(&FieldValue::Real(3.0)));
        assert!(FieldValue::Real(3.0).matches(&FieldValue::Integer(3)));
        assert!(!FieldValue::String("3".into()).matches(&FieldValue::Integer(3)));
        assert!(FieldValue::Null.matches(&FieldValue::Null));
    }

    #[test]
    fn test_large_integers_do_not_round() {
        let big = FieldValue::Integer(9_007_199_254_740_993);
        assert!(!big.matches(&FieldValue::Real(9_007_199_254_740_992.0)));
        assert!(FieldValue::Integer(1 << 53).matches(&FieldValue::Real(9_007_199_254_740_992.0)));
        assert!(!FieldValue::Integer(2).matches(&FieldValue::Real(2.5)));
        assert!(!FieldValue::Integer(i64::MAX).matches(&FieldValue::Real(i64::MAX as f64)));
        assert!(!FieldValue::Integer(0).matches(&FieldValue::Real(f64::NAN)));
    }

    #[test_case("nan"; "nan")]
    #[test_case("NaN"; "mixed case nan")]
    #[test_case("inf"; "inf")]
    #[test_case("-infinity"; "negative infinity")]
    fn test_non_finite_literals_stay_strings(literal: &str) {
        assert_eq!(
            FieldValue::parse_literal(literal),
            FieldValue::String(literal.to_string())
        );
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(FieldValue::parse_literal("42"), FieldValue::Integer(42));
        assert_eq!(FieldValue::parse_literal("4.5"), FieldValue::Real(4.5));
        assert_eq!(FieldValue::parse_literal("true"), FieldValue::Bool(true));
        assert_eq!(FieldValue::parse_literal("null"), FieldValue::Null);
        assert_eq!(
            FieldValue::parse_literal("Main St"),
            FieldValue::String("Main St".into())
        );
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"a": [1, 2]});
        assert_eq!(FieldValue::from_json(&json), FieldValue::Json(json.clone()));
        assert_eq!(FieldValue::from_json(&serde_json::json!(1.5)).to_json(), serde_json::json!(1.5));
    }
}
