//! The data record handed to the merge engine.

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;

use super::{ItemRecord, Value};
use crate::error::{Error, Result};
use crate::merge::Lookup;

/// An ordered mapping of field names to scalars or repeating groups.
///
/// Records are assembled from form input or a store fetch, then passed
/// read-only to the merge engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DataRecord {
    fields: IndexMap<String, Value>,
}

impl DataRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Remove a field, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    /// Get a field value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a scalar field.
    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_scalar)
    }

    /// Get the items of a repeating group.
    pub fn group(&self, key: &str) -> Option<&[ItemRecord]> {
        self.fields.get(key).and_then(Value::as_group)
    }

    /// Get the items of a repeating group for in-place edits.
    pub fn group_mut(&mut self, key: &str) -> Option<&mut Vec<ItemRecord>> {
        match self.fields.get_mut(key) {
            Some(Value::Group(items)) => Some(items),
            _ => None,
        }
    }

    /// Check whether the record defines a key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Scalar fields in insertion order.
    pub fn scalars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(|(k, v)| v.as_scalar().map(|s| (k.as_str(), s)))
    }

    /// Repeating groups in insertion order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[ItemRecord])> {
        self.fields
            .iter()
            .filter_map(|(k, v)| v.as_group().map(|g| (k.as_str(), g)))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a record from a JSON object.
    ///
    /// Scalars are coerced to display strings: strings verbatim, numbers as
    /// written, booleans as `true`/`false`, null as the empty string. The
    /// spelling is JSON's rather than a Python form's, so a flag prints as
    /// `true` and not `True`, and an absent value prints nothing rather than
    /// `None`. An array of objects becomes a repeating group and an array of
    /// scalars is joined with `", "`. Store identifiers of the form `{"$oid": "..."}`
    /// collapse to the id string. Any other nested object, and any nested
    /// value inside an item, is dropped with a warning.
    pub fn from_json(value: Json) -> Result<Self> {
        let map = match value {
            Json::Object(map) => map,
            other => {
                return Err(Error::InvalidRecord(format!(
                    "expected a JSON object, found {}",
                    json_kind(&other)
                )))
            }
        };

        let mut record = Self::new();
        for (key, value) in map {
            match value {
                Json::Array(values) if values.iter().any(Json::is_object) => {
                    let items = values
                        .into_iter()
                        .filter_map(|v| item_from_json(&key, v))
                        .collect::<Vec<_>>();
                    record.insert(key, Value::Group(items));
                }
                Json::Array(values) if values.is_empty() => {
                    record.insert(key, Value::Group(Vec::new()));
                }
                Json::Array(values) => {
                    let joined = values
                        .iter()
                        .filter_map(scalar_to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    record.insert(key, Value::Scalar(joined));
                }
                Json::Object(ref obj) => match obj.get("$oid").and_then(Json::as_str) {
                    Some(oid) => {
                        record.insert(key, Value::Scalar(oid.to_string()));
                    }
                    None => warn!("dropping nested object under record key '{}'", key),
                },
                other => {
                    if let Some(s) = scalar_to_string(&other) {
                        record.insert(key, Value::Scalar(s));
                    }
                }
            }
        }
        Ok(record)
    }

    /// Parse a record from JSON text.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_json(serde_json::from_str(s)?)
    }

    /// Convert the record back to a JSON object.
    pub fn to_json(&self) -> Json {
        let map = self
            .fields
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::Scalar(s) => Json::String(s.clone()),
                    Value::Group(items) => Json::Array(
                        items
                            .iter()
                            .map(|item| {
                                Json::Object(
                                    item.iter()
                                        .map(|(k, v)| (k.to_string(), Json::String(v.to_string())))
                                        .collect(),
                                )
                            })
                            .collect(),
                    ),
                };
                (k.clone(), value)
            })
            .collect();
        Json::Object(map)
    }
}

impl<'de> Deserialize<'de> for DataRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Json::deserialize(deserializer)?;
        DataRecord::from_json(value).map_err(serde::de::Error::custom)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for DataRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Only scalar entries resolve during flat substitution.
impl Lookup for DataRecord {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.scalar(key)
    }
}

impl Lookup for ItemRecord {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key)
    }
}

fn item_from_json(group: &str, value: Json) -> Option<ItemRecord> {
    let Json::Object(map) = value else {
        warn!("dropping non-object entry in group '{}'", group);
        return None;
    };
    let mut item = ItemRecord::new();
    for (key, value) in map {
        match scalar_to_string(&value) {
            Some(s) => {
                item.insert(key, s);
            }
            None => warn!("dropping nested value '{}' in group '{}'", key, group),
        }
    }
    Some(item)
}

fn scalar_to_string(value: &Json) -> Option<String> {
    match value {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(b) => Some(b.to_string()),
        Json::Null => Some(String::new()),
        Json::Array(_) | Json::Object(_) => None,
    }
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_coercion() {
        let record = DataRecord::from_json(json!({
            "_id": {"$oid": "6710c2a9f1"},
            "invoice_no": "ZC/IN/0042",
            "total_boxes": 12,
            "total_net_weight": 10.5,
            "paid": false,
            "notes": null,
            "tags": ["fragile", 3]
        }))
        .unwrap();

        assert_eq!(record.scalar("_id"), Some("6710c2a9f1"));
        assert_eq!(record.scalar("invoice_no"), Some("ZC/IN/0042"));
        assert_eq!(record.scalar("total_boxes"), Some("12"));
        assert_eq!(record.scalar("total_net_weight"), Some("10.5"));
        assert_eq!(record.scalar("paid"), Some("false"));
        assert_eq!(record.scalar("notes"), Some(""));
        assert_eq!(record.scalar("tags"), Some("fragile, 3"));
    }

    #[test]
    fn test_from_json_groups() {
        let record = DataRecord::from_json(json!({
            "items": [
                {"item_number": 1, "material": "GRP", "boxes": [{"box_number": 1}]},
                {"item_number": 2, "material": "Steel"}
            ],
            "empty": []
        }))
        .unwrap();

        let items = record.group("items").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get("item_number"), Some("1"));
        assert!(!items[0].contains_key("boxes"));
        assert_eq!(items[1].get("material"), Some("Steel"));
        assert_eq!(record.group("empty").map(|g| g.len()), Some(0));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = DataRecord::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_nested_object_dropped() {
        let record = DataRecord::from_json(json!({"a": {"b": 1}, "c": "d"})).unwrap();
        assert!(!record.contains_key("a"));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_preserves_insertion_order() {
        let record = DataRecord::from_json_str(r#"{"z": "1", "a": "2", "m": [{"k": "v"}]}"#).unwrap();
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(record.scalars().count(), 2);
        assert_eq!(record.groups().map(|(k, _)| k).collect::<Vec<_>>(), vec!["m"]);
    }

    #[test]
    fn test_to_json_roundtrip_shape() {
        let mut record = DataRecord::new();
        record.insert("date", "16-10-2026");
        record.insert(
            "line_items",
            vec![[("line_no", "1")].into_iter().collect::<ItemRecord>()],
        );
        let json = record.to_json();
        assert_eq!(json, json!({"date": "16-10-2026", "line_items": [{"line_no": "1"}]}));

        let back: DataRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_lookup_excludes_groups() {
        let mut record = DataRecord::new();
        record.insert("a", "X");
        record.insert("items", Vec::<ItemRecord>::new());
        assert_eq!(record.lookup("a"), Some("X"));
        assert_eq!(record.lookup("items"), None);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut record: DataRecord = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        record.remove("b");
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "c"]);
    }
}
