//! Nested value model shared by plugin settings, applet plans and run outcomes.
//!
//! # Responsibility
//! - Represent every shape the persistence layer accepts from callers.
//! - Provide cheap constructors and accessors for call sites and tests.
//!
//! # Invariants
//! - `Map` keys are ordered, so two equal maps always encode identically.
//! - `Float` must be finite to be persisted; the codec rejects NaN/inf.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key-ordered mapping used for `Value::Map`.
pub type ValueMap = BTreeMap<String, Value>;

/// Caller-owned nested value stored in encoded form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(ValueMap),
}

impl Value {
    /// Builds a map value from `(key, value)` pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Builds a list value from any iterator of values.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self::List(items.into_iter().collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Looks up a key when this value is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Returns `true` when every float nested in this value is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Float(value) => value.is_finite(),
            Self::List(items) => items.iter().all(Value::is_finite),
            Self::Map(map) => map.values().all(Value::is_finite),
            Self::String(_) | Self::Integer(_) | Self::Bool(_) => true,
        }
    }

    /// Returns `true` when lists/maps nest more than `limit` levels.
    pub fn nests_deeper_than(&self, limit: usize) -> bool {
        match self {
            Self::List(items) => {
                limit == 0 || items.iter().any(|item| item.nests_deeper_than(limit - 1))
            }
            Self::Map(map) => {
                limit == 0 || map.values().any(|item| item.nests_deeper_than(limit - 1))
            }
            Self::String(_) | Self::Integer(_) | Self::Float(_) | Self::Bool(_) => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Self::Map(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Value;

    #[test]
    fn map_accessors_find_nested_keys() {
        let value = Value::map([
            ("name", Value::from("spotify")),
            ("enabled", Value::from(true)),
        ]);

        assert_eq!(value.get("name").and_then(Value::as_str), Some("spotify"));
        assert_eq!(value.get("enabled"), Some(&Value::Bool(true)));
        assert!(value.get("missing").is_none());
        assert!(Value::from("scalar").get("name").is_none());
    }

    #[test]
    fn is_finite_inspects_nested_floats() {
        let ok = Value::list([Value::from(1.5), Value::map([("x", Value::from(2.0))])]);
        let bad = Value::list([Value::map([("x", Value::from(f64::NAN))])]);

        assert!(ok.is_finite());
        assert!(!bad.is_finite());
    }

    #[test]
    fn nesting_depth_counts_containers_only() {
        let two_levels = Value::list([Value::map([("x", Value::from(1_i64))])]);

        assert!(!Value::from("scalar").nests_deeper_than(0));
        assert!(Value::list([]).nests_deeper_than(0));
        assert!(!two_levels.nests_deeper_than(2));
        assert!(two_levels.nests_deeper_than(1));
    }
}
