//! Record values: scalars and repeating groups.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A value stored under a record key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A display string
    Scalar(String),

    /// An ordered list of item records driving row expansion
    Group(Vec<ItemRecord>),
}

impl Value {
    /// Get the scalar string, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Group(_) => None,
        }
    }

    /// Get the group items, if this is a group.
    pub fn as_group(&self) -> Option<&[ItemRecord]> {
        match self {
            Value::Group(items) => Some(items),
            Value::Scalar(_) => None,
        }
    }

    /// Check if this value is a repeating group.
    pub fn is_group(&self) -> bool {
        matches!(self, Value::Group(_))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s)
    }
}

impl From<Vec<ItemRecord>> for Value {
    fn from(items: Vec<ItemRecord>) -> Self {
        Value::Group(items)
    }
}

/// One entry of a repeating group: a flat, ordered key to string map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRecord {
    fields: IndexMap<String, String>,
}

impl ItemRecord {
    /// Create an empty item.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(key.into(), value.into())
    }

    /// Get a field value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Check whether the item defines a key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the item has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ItemRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
