//! DynamoDB-typed JSON values
//!
//! The wire protocol encodes every attribute as a single-key JSON object
//! tagging the value with its type: `{"S": "text"}`, `{"N": "42"}`,
//! `{"BOOL": true}`, `{"NULL": true}`, `{"L": [...]}`, `{"M": {...}}`.
//! This module provides constructors and accessors over that encoding.
//! Binary and set types are not covered.

use serde_json::{json, Map, Value};
use std::str::FromStr;

/// A raw item: attribute name mapped to a typed JSON value
pub type Item = Map<String, Value>;

/// Build a string attribute (`{"S": ...}`)
pub fn s(value: impl Into<String>) -> Value {
    let value: String = value.into();
    json!({ "S": value })
}

/// Build a number attribute (`{"N": ...}`)
///
/// Numbers travel as strings on the wire.
pub fn n(value: impl ToString) -> Value {
    json!({ "N": value.to_string() })
}

/// Build a boolean attribute (`{"BOOL": ...}`)
pub fn boolean(value: bool) -> Value {
    json!({ "BOOL": value })
}

/// Build a null attribute (`{"NULL": true}`)
pub fn null() -> Value {
    json!({ "NULL": true })
}

/// Read a string attribute back out
pub fn as_s(value: &Value) -> Option<&str> {
    value.get("S")?.as_str()
}

/// Read and parse a number attribute
pub fn as_n<T: FromStr>(value: &Value) -> Option<T> {
    value.get("N")?.as_str()?.parse().ok()
}

/// Read a boolean attribute
pub fn as_bool(value: &Value) -> Option<bool> {
    value.get("BOOL")?.as_bool()
}

/// A primary-key component value
///
/// Key attributes are restricted to strings and numbers. Equality is
/// value-based, which makes the type usable directly as a dedup identity
/// component without going through a formatted string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyValue {
    /// String key component
    S(String),
    /// Number key component (string-encoded, as on the wire)
    N(String),
}

impl KeyValue {
    /// Create a string key value
    pub fn s(value: impl Into<String>) -> Self {
        KeyValue::S(value.into())
    }

    /// Create a number key value
    pub fn n(value: impl ToString) -> Self {
        KeyValue::N(value.to_string())
    }

    /// Encode as a typed JSON attribute
    pub fn to_attr(&self) -> Value {
        match self {
            KeyValue::S(v) => s(v.clone()),
            KeyValue::N(v) => json!({ "N": v }),
        }
    }

    /// Decode from a typed JSON attribute
    pub fn from_attr(value: &Value) -> Option<Self> {
        if let Some(v) = value.get("S").and_then(Value::as_str) {
            return Some(KeyValue::S(v.to_string()));
        }
        if let Some(v) = value.get("N").and_then(Value::as_str) {
            return Some(KeyValue::N(v.to_string()));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_attribute_roundtrip() {
        assert_eq!(as_s(&s("alpha")), Some("alpha"));
        assert_eq!(as_n::<i64>(&n(42)), Some(42));
        assert_eq!(as_bool(&boolean(true)), Some(true));
        assert_eq!(null(), json!({ "NULL": true }));
    }

    #[test]
    fn test_key_value_attr_roundtrip() {
        let hash = KeyValue::n(7);
        assert_eq!(KeyValue::from_attr(&hash.to_attr()), Some(hash));

        let range = KeyValue::s("2026-08-06");
        assert_eq!(KeyValue::from_attr(&range.to_attr()), Some(range));
    }

    #[test]
    fn test_key_value_equality_is_value_based() {
        assert_eq!(KeyValue::n(1), KeyValue::N("1".to_string()));
        assert_ne!(KeyValue::n(1), KeyValue::s("1"));
    }

    #[test]
    fn test_as_n_rejects_wrong_type() {
        assert_eq!(as_n::<i64>(&s("1")), None);
    }
}
