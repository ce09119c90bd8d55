//! Conversion between typed-JSON attribute values and SDK values
//!
//! The wire document model travels as DynamoDB-typed JSON
//! (`{"S": ...}`, `{"N": ...}`, ...); the SDK wants its own
//! `AttributeValue` enum. Binary and set types are not converted.

use aws_sdk_dynamodb::types::AttributeValue;
use dynatx_core::{Item, StoreError};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Convert one typed-JSON attribute to an SDK attribute value
pub fn value_to_attr(value: &Value) -> Result<AttributeValue, StoreError> {
    let object = value.as_object().ok_or_else(|| {
        StoreError::invalid_item(format!("expected typed attribute value, got {value}"))
    })?;
    let (tag, inner) = match object.iter().next() {
        Some(entry) if object.len() == 1 => entry,
        _ => {
            return Err(StoreError::invalid_item(format!(
                "expected single-key typed attribute value, got {value}"
            )))
        }
    };
    match (tag.as_str(), inner) {
        ("S", Value::String(s)) => Ok(AttributeValue::S(s.clone())),
        ("N", Value::String(n)) => Ok(AttributeValue::N(n.clone())),
        ("BOOL", Value::Bool(b)) => Ok(AttributeValue::Bool(*b)),
        ("NULL", _) => Ok(AttributeValue::Null(true)),
        ("L", Value::Array(items)) => {
            let list = items
                .iter()
                .map(value_to_attr)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AttributeValue::L(list))
        }
        ("M", Value::Object(entries)) => {
            let mut map = HashMap::with_capacity(entries.len());
            for (name, entry) in entries {
                map.insert(name.clone(), value_to_attr(entry)?);
            }
            Ok(AttributeValue::M(map))
        }
        _ => Err(StoreError::invalid_item(format!(
            "unsupported attribute type tag {tag}"
        ))),
    }
}

/// Convert one SDK attribute value back to typed JSON
pub fn attr_to_value(attr: &AttributeValue) -> Result<Value, StoreError> {
    match attr {
        AttributeValue::S(s) => Ok(json!({ "S": s })),
        AttributeValue::N(n) => Ok(json!({ "N": n })),
        AttributeValue::Bool(b) => Ok(json!({ "BOOL": b })),
        AttributeValue::Null(_) => Ok(json!({ "NULL": true })),
        AttributeValue::L(list) => {
            let items = list
                .iter()
                .map(attr_to_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(json!({ "L": items }))
        }
        AttributeValue::M(map) => {
            let mut entries = Map::with_capacity(map.len());
            for (name, entry) in map {
                entries.insert(name.clone(), attr_to_value(entry)?);
            }
            Ok(json!({ "M": entries }))
        }
        _ => Err(StoreError::invalid_item(
            "unsupported attribute value type (binary and set types are not converted)",
        )),
    }
}

/// Convert an item document to an SDK attribute map
pub fn item_to_attrs(item: &Item) -> Result<HashMap<String, AttributeValue>, StoreError> {
    let mut attrs = HashMap::with_capacity(item.len());
    for (name, value) in item {
        attrs.insert(name.clone(), value_to_attr(value)?);
    }
    Ok(attrs)
}

/// Convert an SDK attribute map back to an item document
pub fn attrs_to_item(attrs: &HashMap<String, AttributeValue>) -> Result<Item, StoreError> {
    let mut item = Item::new();
    for (name, attr) in attrs {
        item.insert(name.clone(), attr_to_value(attr)?);
    }
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynatx_core::value;

    #[test]
    fn test_scalar_roundtrip() {
        for attr in [value::s("text"), value::n(42), value::boolean(false), value::null()] {
            let converted = value_to_attr(&attr).unwrap();
            assert_eq!(attr_to_value(&converted).unwrap(), attr);
        }
    }

    #[test]
    fn test_nested_roundtrip() {
        let nested = json!({
            "M": {
                "tags": { "L": [ { "S": "a" }, { "S": "b" } ] },
                "count": { "N": "2" },
            }
        });
        let converted = value_to_attr(&nested).unwrap();
        assert_eq!(attr_to_value(&converted).unwrap(), nested);
    }

    #[test]
    fn test_untyped_value_rejected() {
        assert!(value_to_attr(&json!("bare string")).is_err());
        assert!(value_to_attr(&json!({ "S": "a", "N": "1" })).is_err());
        assert!(value_to_attr(&json!({ "B": "AAAA" })).is_err());
    }

    #[test]
    fn test_item_conversion() {
        let mut item = Item::new();
        item.insert("user_id".to_string(), value::n(1));
        item.insert("currency".to_string(), value::s("USD"));

        let attrs = item_to_attrs(&item).unwrap();
        assert!(matches!(attrs.get("user_id"), Some(AttributeValue::N(n)) if n == "1"));
        assert_eq!(attrs_to_item(&attrs).unwrap(), item);
    }
}
