//! Ordered, schema-free record of named values.
//!
//! A [`Record`] behaves like a mapping and like an object at the same time:
//! [`Record::get`] is the lenient mapping read, [`Record::field`] is the
//! strict attribute-style read that fails with a not-found error.

use std::fmt;

use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter, IterMut, Keys, Values};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as Plain};

use super::value::Value;
use crate::error::{Error, Result};

/// Recursively self-wrapping key-value container.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    entries: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a plain mapping, converting nested values.
    pub fn from_plain(map: Map<String, Plain>) -> Result<Self> {
        let mut record = Self::new();
        for (key, value) in map {
            record.set_plain(key, value)?;
        }
        Ok(record)
    }

    /// Lenient read.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Read with a fallback for absent keys.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.entries.get(key).unwrap_or(default)
    }

    /// Attribute-style read.
    pub fn field(&self, key: &str) -> Result<&Value> {
        self.entries
            .get(key)
            .ok_or_else(|| Error::not_found("record", key))
    }

    pub fn field_mut(&mut self, key: &str) -> Result<&mut Value> {
        self.entries
            .get_mut(key)
            .ok_or_else(|| Error::not_found("record", key))
    }

    /// Insert or replace `key`. An existing key keeps its position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Insert a plain value, wrapping mappings and decoding tagged wrappers.
    pub fn set_plain(&mut self, key: impl Into<String>, value: Plain) -> Result<()> {
        let value = Value::from_plain(value)?;
        self.entries.insert(key.into(), value);
        Ok(())
    }

    /// Remove `key`, failing when it is absent.
    pub fn delete(&mut self, key: &str) -> Result<Value> {
        self.entries
            .shift_remove(key)
            .ok_or_else(|| Error::not_found("record", key))
    }

    /// Remove `key` if present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// Remove and return the most recently inserted entry.
    pub fn pop_last(&mut self) -> Option<(String, Value)> {
        self.entries.pop()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.entries.keys()
    }

    pub fn values(&self) -> Values<'_, String, Value> {
        self.entries.values()
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, String, Value> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Insert `default` if `key` is absent, then return the stored value.
    pub fn set_default(&mut self, key: impl Into<String>, default: impl Into<Value>) -> &mut Value {
        self.entries.entry(key.into()).or_insert_with(|| default.into())
    }

    /// Set every pair in order, each through [`Record::set`].
    pub fn update<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in pairs {
            self.set(key, value);
        }
    }

    /// Merge `other` first, then `overrides`.
    pub fn merge<I, K, V>(&mut self, other: &Record, overrides: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.update(other.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.update(overrides);
    }

    /// Recursively unwrap into a plain mapping.
    pub fn to_plain(&self) -> Map<String, Plain> {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_plain()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        record.update(iter);
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_plain().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = Map::<String, Plain>::deserialize(deserializer)?;
        Record::from_plain(map).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Plain::Object(self.to_plain()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::record;
    use serde_json::json;

    #[test]
    fn test_field_on_missing_key_is_not_found() {
        let rec = Record::new();
        assert!(rec.field("missing").unwrap_err().is_not_found());
        assert_eq!(rec.get("missing"), None);
        assert_eq!(rec.get_or("missing", &Value::from("fallback")), &Value::from("fallback"));
    }

    #[test]
    fn test_set_plain_wraps_nested_mappings() {
        let mut rec = Record::new();
        rec.set_plain("headers", json!({"auth": {"scheme": "Bearer"}}))
            .unwrap();
        let headers = rec.field("headers").unwrap().as_record().unwrap();
        assert!(headers.field("auth").unwrap().as_record().is_some());
    }

    #[test]
    fn test_delete() {
        let mut rec = record(json!({"a": 1, "b": 2}));
        assert_eq!(rec.delete("a").unwrap(), Value::from(1i64));
        assert!(!rec.contains("a"));
        assert!(rec.delete("a").unwrap_err().is_not_found());
        assert_eq!(rec.len(), 1);
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut rec = Record::new();
        rec.set("zeta", 1i64);
        rec.set("alpha", 2i64);
        rec.set("mid", 3i64);
        rec.set("zeta", 4i64);
        let keys: Vec<_> = rec.keys().cloned().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(rec.get("zeta"), Some(&Value::from(4i64)));
    }

    #[test]
    fn test_set_default_only_inserts_when_absent() {
        let mut rec = record(json!({"lang": "KO"}));
        assert_eq!(rec.set_default("lang", "EN"), &Value::from("KO"));
        assert_eq!(rec.set_default("tone", "formal"), &Value::from("formal"));
        assert_eq!(rec.len(), 2);
    }

    #[test]
    fn test_merge_applies_overrides_last() {
        let mut rec = record(json!({"a": 1}));
        let other = record(json!({"a": 2, "b": {"c": 3}}));
        rec.merge(&other, [("b", Value::from("override"))]);
        assert_eq!(rec.get("a"), Some(&Value::from(2i64)));
        assert_eq!(rec.get("b"), Some(&Value::from("override")));
    }

    #[test]
    fn test_pop_last_and_clear() {
        let mut rec = record(json!({"a": 1, "b": 2}));
        assert_eq!(rec.pop_last(), Some(("b".to_string(), Value::from(2i64))));
        rec.clear();
        assert!(rec.is_empty());
        assert_eq!(rec.pop_last(), None);
    }

    #[test]
    fn test_copy_is_independent() {
        let original = record(json!({"nested": {"x": 1}}));
        let mut copy = original.clone();
        copy.field_mut("nested")
            .unwrap()
            .as_record_mut()
            .unwrap()
            .set("x", 2i64);
        let nested = original.field("nested").unwrap().as_record().unwrap();
        assert_eq!(nested.get("x"), Some(&Value::from(1i64)));
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let yaml = "model: deepseek-chat\ndata_template:\n  target_lang: KO\n";
        let rec: Record = serde_yaml::from_str(yaml).unwrap();
        let template = rec.field("data_template").unwrap().as_record().unwrap();
        assert_eq!(template.get("target_lang"), Some(&Value::from("KO")));
    }

    #[test]
    fn test_to_plain_roundtrip() {
        let plain = json!({"b": [1, {"c": null}], "a": "x"});
        assert_eq!(Plain::Object(record(plain.clone()).to_plain()), plain);
    }
}
