use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;

/// One attribute of a DICOM JSON dataset (PS3.18 F.2.2).
///
/// Exactly one of `value`, `bulk_data_uri`, `inline_binary` is normally
/// present. All fields are optional so any JSON object decodes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WireAttribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vr: Option<String>,
    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Vec<Value>>,
    #[serde(rename = "BulkDataURI", default, skip_serializing_if = "Option::is_none")]
    pub bulk_data_uri: Option<String>,
    #[serde(rename = "InlineBinary", default, skip_serializing_if = "Option::is_none")]
    pub inline_binary: Option<String>,
}

impl WireAttribute {
    pub fn with_values(vr: &str, values: Vec<Value>) -> Self {
        Self {
            vr: Some(vr.to_string()),
            value: Some(values),
            ..Default::default()
        }
    }

    /// Attribute whose value is held at `uri`.
    pub fn bulk_data(vr: &str, uri: impl Into<String>) -> Self {
        Self {
            vr: Some(vr.to_string()),
            bulk_data_uri: Some(uri.into()),
            ..Default::default()
        }
    }

    /// First element of `Value`, if any.
    pub fn first(&self) -> Option<&Value> {
        self.value.as_ref().and_then(|v| v.first())
    }
}

/// Tag-keyed attribute dictionary, the DICOM JSON model of one instance or
/// one query result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireDataset(BTreeMap<String, WireAttribute>);

impl WireDataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a dataset from a JSON object.
    pub fn from_json_value(value: &Value) -> Result<Self, TypeError> {
        if !value.is_object() {
            return Err(TypeError::NotAnObject(json_kind(value)));
        }
        serde_json::from_value(value.clone()).map_err(|e| TypeError::InvalidJson(e.to_string()))
    }

    /// Decode a JSON array of datasets, as returned by QIDO-RS and the
    /// WADO-RS metadata resource.
    pub fn list_from_slice(data: &[u8]) -> Result<Vec<Self>, TypeError> {
        serde_json::from_slice(data).map_err(|e| TypeError::InvalidJson(e.to_string()))
    }

    pub fn insert(&mut self, tag: impl Into<String>, attribute: WireAttribute) {
        self.0.insert(tag.into(), attribute);
    }

    /// Builder form of [`insert`](Self::insert) for a single string value.
    pub fn with_string(mut self, tag: &str, vr: &str, value: &str) -> Self {
        self.insert(tag, WireAttribute::with_values(vr, vec![Value::from(value)]));
        self
    }

    /// Builder form of [`insert`](Self::insert) for a single numeric value.
    pub fn with_number(mut self, tag: &str, vr: &str, value: i64) -> Self {
        self.insert(tag, WireAttribute::with_values(vr, vec![Value::from(value)]));
        self
    }

    pub fn with_attribute(mut self, tag: &str, attribute: WireAttribute) -> Self {
        self.insert(tag, attribute);
        self
    }

    /// Attribute under `tag`.
    pub fn get(&self, tag: &str) -> Option<&WireAttribute> {
        self.0.get(tag)
    }

    /// First value of `tag` as a string.
    pub fn string(&self, tag: &str) -> Option<&str> {
        self.get(tag).and_then(|a| a.first()).and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &WireAttribute)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, WireAttribute)> for WireDataset {
    fn from_iter<I: IntoIterator<Item = (String, WireAttribute)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
