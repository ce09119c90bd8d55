//! Wire protocol types and field whitelists
//!
//! Defines the request/response documents for the two transactional RPCs
//! and the per-operation field whitelists.
//!
//! ## Request shapes
//!
//! ```text
//! TransactGetItems:
//!   { TransactItems: [ {Get: {Key, TableName, ...}}, ... ],
//!     ReturnConsumedCapacity?: "INDEXES" | "TOTAL" | "NONE" }
//!
//! TransactWriteItems:
//!   { TransactItems: [ {ConditionCheck|Delete|Put|Update: {...}}, ... ],
//!     ClientRequestToken?: <string, at most 36 chars>,
//!     ReturnConsumedCapacity?: <mode>,
//!     ReturnItemCollectionMetrics?: "SIZE" | "NONE" }
//! ```
//!
//! The whitelists are part of the wire contract: a field outside its
//! operation's whitelist must never reach the network, even if a caller
//! supplied it.

use crate::value::Item;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Raw operation arguments: field name mapped to a JSON value
///
/// Callers may pass a superset of fields; formatting projects it onto the
/// operation's whitelist.
pub type OperationArgs = Map<String, Value>;

/// Hard cap on items per transaction request, mirroring the store's limit
pub const MAX_TRANSACT_ITEMS: usize = 10;

/// Maximum length of a client request token
pub const MAX_CLIENT_REQUEST_TOKEN_LEN: usize = 36;

/// Condition expression field
pub const PARAM_CONDITION_EXPRESSION: &str = "ConditionExpression";

/// Expression attribute name aliases (`#name` placeholders)
pub const PARAM_EXPRESSION_ATTRIBUTE_NAMES: &str = "ExpressionAttributeNames";

/// Expression attribute values (`:value` placeholders)
pub const PARAM_EXPRESSION_ATTRIBUTE_VALUES: &str = "ExpressionAttributeValues";

/// Primary key of the target item
pub const PARAM_KEY: &str = "Key";

/// Full item payload (put only)
pub const PARAM_ITEM: &str = "Item";

/// Target table name
pub const PARAM_TABLE_NAME: &str = "TableName";

/// Projection expression (get only)
pub const PARAM_PROJECTION_EXPRESSION: &str = "ProjectionExpression";

/// Update expression (update only)
pub const PARAM_UPDATE_EXPRESSION: &str = "UpdateExpression";

/// Return-values request, as accepted from callers
///
/// Never sent on the wire; renamed to
/// [`PARAM_RETURN_VALUES_ON_CONDITION_FAILURE`] before whitelist filtering.
pub const PARAM_RETURN_VALUES: &str = "ReturnValues";

/// Return-values-on-condition-failure field, the outgoing form
pub const PARAM_RETURN_VALUES_ON_CONDITION_FAILURE: &str = "ReturnValuesOnConditionCheckFailure";

const CONDITION_CHECK_FIELDS: &[&str] = &[
    PARAM_CONDITION_EXPRESSION,
    PARAM_EXPRESSION_ATTRIBUTE_NAMES,
    PARAM_EXPRESSION_ATTRIBUTE_VALUES,
    PARAM_KEY,
    PARAM_RETURN_VALUES_ON_CONDITION_FAILURE,
    PARAM_TABLE_NAME,
];

const DELETE_FIELDS: &[&str] = &[
    PARAM_CONDITION_EXPRESSION,
    PARAM_EXPRESSION_ATTRIBUTE_NAMES,
    PARAM_EXPRESSION_ATTRIBUTE_VALUES,
    PARAM_KEY,
    PARAM_RETURN_VALUES_ON_CONDITION_FAILURE,
    PARAM_TABLE_NAME,
];

const GET_FIELDS: &[&str] = &[
    PARAM_EXPRESSION_ATTRIBUTE_NAMES,
    PARAM_EXPRESSION_ATTRIBUTE_VALUES,
    PARAM_KEY,
    PARAM_PROJECTION_EXPRESSION,
    PARAM_TABLE_NAME,
];

const PUT_FIELDS: &[&str] = &[
    PARAM_CONDITION_EXPRESSION,
    PARAM_EXPRESSION_ATTRIBUTE_NAMES,
    PARAM_EXPRESSION_ATTRIBUTE_VALUES,
    PARAM_ITEM,
    PARAM_RETURN_VALUES_ON_CONDITION_FAILURE,
    PARAM_TABLE_NAME,
];

const UPDATE_FIELDS: &[&str] = &[
    PARAM_CONDITION_EXPRESSION,
    PARAM_EXPRESSION_ATTRIBUTE_NAMES,
    PARAM_EXPRESSION_ATTRIBUTE_VALUES,
    PARAM_KEY,
    PARAM_RETURN_VALUES_ON_CONDITION_FAILURE,
    PARAM_TABLE_NAME,
    PARAM_UPDATE_EXPRESSION,
];

/// The kind of a transact item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Assert a condition against an item without mutating it
    ConditionCheck,
    /// Delete an item
    Delete,
    /// Read an item (read transactions only)
    Get,
    /// Create or replace an item
    Put,
    /// Apply an update expression to an item
    Update,
}

impl OperationKind {
    /// Wire tag for this operation kind
    pub fn tag(self) -> &'static str {
        match self {
            OperationKind::ConditionCheck => "ConditionCheck",
            OperationKind::Delete => "Delete",
            OperationKind::Get => "Get",
            OperationKind::Put => "Put",
            OperationKind::Update => "Update",
        }
    }

    /// Fields this operation kind is permitted to send
    pub fn allowed_fields(self) -> &'static [&'static str] {
        match self {
            OperationKind::ConditionCheck => CONDITION_CHECK_FIELDS,
            OperationKind::Delete => DELETE_FIELDS,
            OperationKind::Get => GET_FIELDS,
            OperationKind::Put => PUT_FIELDS,
            OperationKind::Update => UPDATE_FIELDS,
        }
    }
}

/// One formatted operation record inside a transaction request
///
/// Serializes as the single-key mapping `{ "<Kind>": { ...fields } }`.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactItem {
    /// Operation kind tag
    pub kind: OperationKind,
    /// Whitelist-filtered fields
    pub fields: OperationArgs,
}

impl Serialize for TransactItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.kind.tag(), &self.fields)?;
        map.end()
    }
}

/// Consumed-capacity reporting mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnConsumedCapacity {
    /// Report capacity, broken out per index
    Indexes,
    /// Report total capacity only
    Total,
    /// No capacity reporting
    None,
}

impl ReturnConsumedCapacity {
    /// Wire string for this mode
    pub fn as_str(self) -> &'static str {
        match self {
            ReturnConsumedCapacity::Indexes => "INDEXES",
            ReturnConsumedCapacity::Total => "TOTAL",
            ReturnConsumedCapacity::None => "NONE",
        }
    }
}

/// Item-collection-metrics reporting mode (write transactions only)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnItemCollectionMetrics {
    /// Report item collection sizes
    Size,
    /// No metrics reporting
    None,
}

impl ReturnItemCollectionMetrics {
    /// Wire string for this mode
    pub fn as_str(self) -> &'static str {
        match self {
            ReturnItemCollectionMetrics::Size => "SIZE",
            ReturnItemCollectionMetrics::None => "NONE",
        }
    }
}

/// A batched-read request
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransactGetRequest {
    /// Ordered get operations, at most [`MAX_TRANSACT_ITEMS`]
    pub transact_items: Vec<TransactItem>,
    /// Optional consumed-capacity reporting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
}

/// A batched-write request
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransactWriteRequest {
    /// Ordered write operations, at most [`MAX_TRANSACT_ITEMS`]
    pub transact_items: Vec<TransactItem>,
    /// Optional idempotency token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_request_token: Option<String>,
    /// Optional consumed-capacity reporting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
    /// Optional item-collection-metrics reporting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_item_collection_metrics: Option<ReturnItemCollectionMetrics>,
}

/// One entry of a batched-read response
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemResponse {
    /// The raw item, absent when the store holds no item for the key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
}

/// A batched-read response: one entry per requested item, same order
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransactGetResponse {
    /// Per-item responses in request order
    pub responses: Vec<ItemResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;
    use serde_json::json;

    #[test]
    fn test_transact_item_serializes_as_single_key_mapping() {
        let mut fields = OperationArgs::new();
        fields.insert(PARAM_TABLE_NAME.to_string(), json!("user"));
        let item = TransactItem {
            kind: OperationKind::Get,
            fields,
        };

        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({ "Get": { "TableName": "user" } })
        );
    }

    #[test]
    fn test_write_request_wire_shape() {
        let mut fields = OperationArgs::new();
        fields.insert(PARAM_TABLE_NAME.to_string(), json!("user"));
        fields.insert(
            PARAM_KEY.to_string(),
            json!({ "user_id": value::n(1) }),
        );

        let request = TransactWriteRequest {
            transact_items: vec![TransactItem {
                kind: OperationKind::Delete,
                fields,
            }],
            client_request_token: Some("token".to_string()),
            return_consumed_capacity: Some(ReturnConsumedCapacity::Total),
            return_item_collection_metrics: None,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "TransactItems": [
                    { "Delete": { "Key": { "user_id": { "N": "1" } }, "TableName": "user" } }
                ],
                "ClientRequestToken": "token",
                "ReturnConsumedCapacity": "TOTAL",
            })
        );
    }

    #[test]
    fn test_item_response_absent_item_deserializes_to_none() {
        let response: TransactGetResponse =
            serde_json::from_value(json!({ "Responses": [{}, { "Item": {} }] })).unwrap();
        assert_eq!(response.responses.len(), 2);
        assert!(response.responses[0].item.is_none());
        assert_eq!(response.responses[1].item, Some(Item::new()));
    }

    #[test]
    fn test_mode_wire_strings() {
        assert_eq!(
            serde_json::to_value(ReturnConsumedCapacity::Indexes).unwrap(),
            json!("INDEXES")
        );
        assert_eq!(
            serde_json::to_value(ReturnItemCollectionMetrics::Size).unwrap(),
            json!("SIZE")
        );
        assert_eq!(ReturnConsumedCapacity::None.as_str(), "NONE");
    }

    #[test]
    fn test_every_whitelist_excludes_return_values() {
        for kind in [
            OperationKind::ConditionCheck,
            OperationKind::Delete,
            OperationKind::Get,
            OperationKind::Put,
            OperationKind::Update,
        ] {
            assert!(!kind.allowed_fields().contains(&PARAM_RETURN_VALUES));
        }
    }
}
