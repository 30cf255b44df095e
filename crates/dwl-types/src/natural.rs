use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A bulk attribute value stored outside the metadata record.
///
/// Starts `Unresolved` and moves to `Resolved` at most once; a resolved
/// reference never reverts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BulkDataRef {
    Unresolved { uri: String },
    Resolved { uri: String, value: Bytes },
}

impl BulkDataRef {
    /// Reference to a value not yet fetched.
    pub fn unresolved(uri: impl Into<String>) -> Self {
        Self::Unresolved { uri: uri.into() }
    }

    /// Where the value lives.
    pub fn uri(&self) -> &str {
        match self {
            Self::Unresolved { uri } | Self::Resolved { uri, .. } => uri,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// The fetched value, once resolved.
    pub fn value(&self) -> Option<&Bytes> {
        match self {
            Self::Resolved { value, .. } => Some(value),
            Self::Unresolved { .. } => None,
        }
    }

    /// Point an unresolved reference at a different URI. Resolved
    /// references are left untouched.
    pub fn set_uri(&mut self, new_uri: String) {
        if let Self::Unresolved { uri } = self {
            *uri = new_uri;
        }
    }

    /// Record the resolved value. Returns `false` if the reference was
    /// already resolved, in which case the existing value is kept.
    pub fn resolve(&mut self, value: Bytes) -> bool {
        match self {
            Self::Unresolved { uri } => {
                let uri = std::mem::take(uri);
                *self = Self::Resolved { uri, value };
                true
            }
            Self::Resolved { .. } => false,
        }
    }
}

/// A naturalized attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    /// Attribute present with no value.
    Empty,
    Text(String),
    Integer(i64),
    Decimal(f64),
    /// Value multiplicity greater than one.
    List(Vec<AttributeValue>),
    /// SQ items, always a list even with a single item.
    Sequence(Vec<NaturalDataset>),
    BulkData(BulkDataRef),
    /// Base64 payload carried inline by the wire record.
    InlineBinary(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::List(items) => items.first().and_then(Self::as_str),
            _ => None,
        }
    }

    /// Integer view. Accepts integral decimals and numeric strings (IS
    /// values sometimes arrive as text).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Decimal(d) if d.fract() == 0.0 => Some(*d as i64),
            Self::Text(s) => s.trim().parse().ok(),
            Self::List(items) => items.first().and_then(Self::as_i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Decimal(d) => Some(*d),
            Self::Text(s) => s.trim().parse().ok(),
            Self::List(items) => items.first().and_then(Self::as_f64),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[NaturalDataset]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn bulk_data(&self) -> Option<&BulkDataRef> {
        match self {
            Self::BulkData(r) => Some(r),
            _ => None,
        }
    }

    pub fn bulk_data_mut(&mut self) -> Option<&mut BulkDataRef> {
        match self {
            Self::BulkData(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Keyword-keyed record produced by naturalization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NaturalDataset(BTreeMap<String, AttributeValue>);

impl NaturalDataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, keyword: impl Into<String>, value: AttributeValue) {
        self.0.insert(keyword.into(), value);
    }

    pub fn get(&self, keyword: &str) -> Option<&AttributeValue> {
        self.0.get(keyword)
    }

    pub fn get_mut(&mut self, keyword: &str) -> Option<&mut AttributeValue> {
        self.0.get_mut(keyword)
    }

    /// String value of `keyword`, if it holds one.
    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.get(keyword).and_then(AttributeValue::as_str)
    }

    pub fn get_i64(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(AttributeValue::as_i64)
    }

    /// Non-negative integer view, e.g. for `NumberOfFrames`.
    pub fn get_u32(&self, keyword: &str) -> Option<u32> {
        self.get_i64(keyword).and_then(|n| u32::try_from(n).ok())
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.0.contains_key(keyword)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut AttributeValue)> {
        self.0.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of bulk data references, including those nested in sequences.
    pub fn bulk_data_count(&self) -> usize {
        self.0.values().map(count_bulk_data).sum()
    }
}

fn count_bulk_data(value: &AttributeValue) -> usize {
    match value {
        AttributeValue::BulkData(_) => 1,
        AttributeValue::Sequence(items) => items.iter().map(NaturalDataset::bulk_data_count).sum(),
        AttributeValue::List(values) => values.iter().map(count_bulk_data).sum(),
        _ => 0,
    }
}

impl FromIterator<(String, AttributeValue)> for NaturalDataset {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
