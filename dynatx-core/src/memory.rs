//! In-memory client implementation for testing
//!
//! Stores tables in memory behind `Arc<RwLock>`, making the client
//! cheaply cloneable and thread-safe. Write batches are applied
//! atomically: every condition is evaluated against the pre-transaction
//! state, and nothing is applied unless all of them hold.
//!
//! Expression support is intentionally small - `attribute_exists` /
//! `attribute_not_exists` conditions and `SET`-only update expressions
//! with `#name` / `:value` placeholders - enough to exercise the
//! transaction layer without a real store.

use crate::client::TransactClient;
use crate::error::{Result, StoreError};
use crate::value::Item;
use crate::wire::{
    ItemResponse, OperationArgs, OperationKind, TransactGetRequest, TransactGetResponse,
    TransactWriteRequest, PARAM_CONDITION_EXPRESSION, PARAM_EXPRESSION_ATTRIBUTE_NAMES,
    PARAM_EXPRESSION_ATTRIBUTE_VALUES, PARAM_ITEM, PARAM_KEY, PARAM_TABLE_NAME,
    PARAM_UPDATE_EXPRESSION,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// In-memory store client for testing
#[derive(Clone, Default)]
pub struct MemoryTransactClient {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Table>,
    /// Request fingerprints of successfully applied tokened writes
    tokens: HashMap<String, String>,
    get_calls: usize,
    write_calls: usize,
}

struct Table {
    hash_key: String,
    range_key: Option<String>,
    items: HashMap<String, Item>,
}

enum Planned {
    Check,
    Put {
        table: String,
        key: String,
        item: Item,
    },
    Delete {
        table: String,
        key: String,
    },
    Update {
        table: String,
        key: String,
        key_item: Item,
        assignments: Vec<(String, Value)>,
    },
}

impl std::fmt::Debug for MemoryTransactClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("MemoryTransactClient")
            .field("table_count", &inner.tables.len())
            .field("write_calls", &inner.write_calls)
            .field("get_calls", &inner.get_calls)
            .finish()
    }
}

impl MemoryTransactClient {
    /// Create a new empty in-memory client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the given key schema
    pub fn create_table(&self, name: &str, hash_key: &str, range_key: Option<&str>) {
        self.inner.write().tables.insert(
            name.to_string(),
            Table {
                hash_key: hash_key.to_string(),
                range_key: range_key.map(str::to_string),
                items: HashMap::new(),
            },
        );
    }

    /// Insert an item directly, bypassing the transactional path
    ///
    /// Convenience for tests to seed state.
    pub fn insert_item(&self, table_name: &str, item: Item) -> Result<()> {
        let mut inner = self.inner.write();
        let table = inner
            .tables
            .get_mut(table_name)
            .ok_or_else(|| StoreError::not_found(format!("table {table_name} does not exist")))?;
        let key = key_of_item(table, &item)?;
        table.items.insert(key, item);
        Ok(())
    }

    /// Number of `transact_write_items` calls received
    pub fn write_call_count(&self) -> usize {
        self.inner.read().write_calls
    }

    /// Number of `transact_get_items` calls received
    pub fn get_call_count(&self) -> usize {
        self.inner.read().get_calls
    }

    /// Number of items currently stored in a table
    pub fn item_count(&self, table_name: &str) -> usize {
        self.inner
            .read()
            .tables
            .get(table_name)
            .map_or(0, |t| t.items.len())
    }
}

#[async_trait]
impl TransactClient for MemoryTransactClient {
    async fn transact_get_items(
        &self,
        request: TransactGetRequest,
    ) -> Result<TransactGetResponse> {
        let mut inner = self.inner.write();
        inner.get_calls += 1;
        debug!(items = request.transact_items.len(), "serving transactional read");

        let mut responses = Vec::with_capacity(request.transact_items.len());
        for item in &request.transact_items {
            if item.kind != OperationKind::Get {
                return Err(StoreError::invalid_item(
                    "only Get items are valid in a read transaction",
                ));
            }
            let table = lookup_table(&inner.tables, &item.fields)?;
            let key = fingerprint(field_obj(&item.fields, PARAM_KEY)?)?;
            responses.push(ItemResponse {
                item: table.items.get(&key).cloned(),
            });
        }
        Ok(TransactGetResponse { responses })
    }

    async fn transact_write_items(&self, request: TransactWriteRequest) -> Result<()> {
        let mut inner = self.inner.write();
        inner.write_calls += 1;
        debug!(
            items = request.transact_items.len(),
            "applying transactional write"
        );

        let request_fingerprint = serde_json::to_string(&request.transact_items)?;
        if let Some(token) = &request.client_request_token {
            if let Some(prior) = inner.tokens.get(token) {
                if *prior == request_fingerprint {
                    // Idempotent replay of an applied request
                    return Ok(());
                }
                return Err(StoreError::idempotent_mismatch(format!(
                    "client request token {token} was already used with a different payload"
                )));
            }
        }

        // Validate everything against pre-transaction state before
        // touching it; the batch applies atomically or not at all.
        let mut plan = Vec::with_capacity(request.transact_items.len());
        let mut reasons = Vec::with_capacity(request.transact_items.len());
        for item in &request.transact_items {
            let table_name = field_str(&item.fields, PARAM_TABLE_NAME)?.to_string();
            let table = inner
                .tables
                .get(&table_name)
                .ok_or_else(|| StoreError::not_found(format!("table {table_name} does not exist")))?;

            let key_item = match item.kind {
                OperationKind::Put => {
                    projected_key(table, field_obj(&item.fields, PARAM_ITEM)?)?
                }
                _ => field_obj(&item.fields, PARAM_KEY)?.clone(),
            };
            let key = fingerprint(&key_item)?;
            let current = table.items.get(&key);
            reasons.push(if eval_condition(&item.fields, current)? {
                "None"
            } else {
                "ConditionalCheckFailed"
            });

            let planned = match item.kind {
                OperationKind::Get => {
                    return Err(StoreError::invalid_item(
                        "Get is not valid in a write transaction",
                    ))
                }
                OperationKind::ConditionCheck => Planned::Check,
                OperationKind::Put => Planned::Put {
                    table: table_name,
                    key,
                    item: field_obj(&item.fields, PARAM_ITEM)?.clone(),
                },
                OperationKind::Delete => Planned::Delete {
                    table: table_name,
                    key,
                },
                OperationKind::Update => Planned::Update {
                    table: table_name,
                    key,
                    key_item,
                    assignments: parse_update(&item.fields)?,
                },
            };
            plan.push(planned);
        }

        if reasons.iter().any(|r| *r != "None") {
            return Err(StoreError::transaction_canceled(format!(
                "[{}]",
                reasons.join(", ")
            )));
        }

        for planned in plan {
            match planned {
                Planned::Check => {}
                Planned::Put { table, key, item } => {
                    if let Some(table) = inner.tables.get_mut(&table) {
                        table.items.insert(key, item);
                    }
                }
                Planned::Delete { table, key } => {
                    if let Some(table) = inner.tables.get_mut(&table) {
                        table.items.remove(&key);
                    }
                }
                Planned::Update {
                    table,
                    key,
                    key_item,
                    assignments,
                } => {
                    if let Some(table) = inner.tables.get_mut(&table) {
                        let item = table.items.entry(key).or_insert(key_item);
                        for (attr, value) in assignments {
                            item.insert(attr, value);
                        }
                    }
                }
            }
        }

        if let Some(token) = request.client_request_token {
            inner.tokens.insert(token, request_fingerprint);
        }
        Ok(())
    }

    async fn get_item(&self, table_name: &str, key: &Item) -> Result<Option<Item>> {
        let inner = self.inner.read();
        let table = inner
            .tables
            .get(table_name)
            .ok_or_else(|| StoreError::not_found(format!("table {table_name} does not exist")))?;
        Ok(table.items.get(&fingerprint(key)?).cloned())
    }
}

/// Canonical storage key for a `Key` attribute map
///
/// `serde_json::Map` keeps keys sorted, so serialization is
/// order-independent and safe to use as an identity.
fn fingerprint(key: &Item) -> Result<String> {
    Ok(serde_json::to_string(key)?)
}

/// Project an item onto its table's key attributes
fn projected_key(table: &Table, item: &Item) -> Result<Item> {
    let mut key = Item::new();
    let hash = item
        .get(&table.hash_key)
        .cloned()
        .ok_or_else(|| StoreError::invalid_item(format!("item missing key attribute {}", table.hash_key)))?;
    key.insert(table.hash_key.clone(), hash);
    if let Some(range) = &table.range_key {
        let value = item
            .get(range)
            .cloned()
            .ok_or_else(|| StoreError::invalid_item(format!("item missing key attribute {range}")))?;
        key.insert(range.clone(), value);
    }
    Ok(key)
}

fn key_of_item(table: &Table, item: &Item) -> Result<String> {
    fingerprint(&projected_key(table, item)?)
}

fn lookup_table<'a>(
    tables: &'a HashMap<String, Table>,
    fields: &OperationArgs,
) -> Result<&'a Table> {
    let name = field_str(fields, PARAM_TABLE_NAME)?;
    tables
        .get(name)
        .ok_or_else(|| StoreError::not_found(format!("table {name} does not exist")))
}

fn field_str<'a>(fields: &'a OperationArgs, name: &str) -> Result<&'a str> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::invalid_item(format!("operation missing {name}")))
}

fn field_obj<'a>(fields: &'a OperationArgs, name: &str) -> Result<&'a Item> {
    fields
        .get(name)
        .and_then(Value::as_object)
        .ok_or_else(|| StoreError::invalid_item(format!("operation missing {name}")))
}

/// Resolve a possibly-aliased attribute path (`#alias` form)
fn resolve_name(name: &str, fields: &OperationArgs) -> Result<String> {
    if !name.starts_with('#') {
        return Ok(name.to_string());
    }
    fields
        .get(PARAM_EXPRESSION_ATTRIBUTE_NAMES)
        .and_then(Value::as_object)
        .and_then(|names| names.get(name))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::other(format!("unresolved attribute alias {name}")))
}

/// Evaluate a condition expression against the current item state
///
/// Supports a single `attribute_exists(path)` or
/// `attribute_not_exists(path)` call. Absent conditions pass.
fn eval_condition(fields: &OperationArgs, current: Option<&Item>) -> Result<bool> {
    let expr = match fields.get(PARAM_CONDITION_EXPRESSION).and_then(Value::as_str) {
        Some(expr) => expr.trim(),
        None => return Ok(true),
    };
    let (func, arg) = expr
        .strip_suffix(')')
        .and_then(|rest| rest.split_once('('))
        .ok_or_else(|| StoreError::other(format!("unsupported condition expression: {expr}")))?;
    let attr = resolve_name(arg.trim(), fields)?;
    let has_attr = current.is_some_and(|item| item.contains_key(&attr));
    match func.trim() {
        "attribute_exists" => Ok(has_attr),
        "attribute_not_exists" => Ok(!has_attr),
        other => Err(StoreError::other(format!(
            "unsupported condition function: {other}"
        ))),
    }
}

/// Parse a `SET`-only update expression into attribute assignments
fn parse_update(fields: &OperationArgs) -> Result<Vec<(String, Value)>> {
    let expr = field_str(fields, PARAM_UPDATE_EXPRESSION)?;
    let body = expr
        .trim()
        .strip_prefix("SET ")
        .ok_or_else(|| StoreError::other(format!("unsupported update expression: {expr}")))?;
    let values = fields
        .get(PARAM_EXPRESSION_ATTRIBUTE_VALUES)
        .and_then(Value::as_object);

    let mut assignments = Vec::new();
    for clause in body.split(',') {
        let (path, operand) = clause
            .split_once('=')
            .ok_or_else(|| StoreError::other(format!("unsupported update clause: {clause}")))?;
        let attr = resolve_name(path.trim(), fields)?;
        let operand = operand.trim();
        let value = values
            .and_then(|map| map.get(operand))
            .cloned()
            .ok_or_else(|| StoreError::other(format!("unresolved value placeholder {operand}")))?;
        assignments.push((attr, value));
    }
    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;
    use crate::wire::TransactItem;
    use serde_json::json;

    fn user_item(id: i64) -> Item {
        let mut item = Item::new();
        item.insert("user_id".to_string(), value::n(id));
        item
    }

    fn put_item(table: &str, item: Item) -> TransactItem {
        let mut fields = OperationArgs::new();
        fields.insert(PARAM_TABLE_NAME.to_string(), json!(table));
        fields.insert(PARAM_ITEM.to_string(), Value::Object(item));
        TransactItem {
            kind: OperationKind::Put,
            fields,
        }
    }

    fn write_request(items: Vec<TransactItem>) -> TransactWriteRequest {
        TransactWriteRequest {
            transact_items: items,
            client_request_token: None,
            return_consumed_capacity: None,
            return_item_collection_metrics: None,
        }
    }

    #[tokio::test]
    async fn test_write_then_get_item() {
        let client = MemoryTransactClient::new();
        client.create_table("user", "user_id", None);

        client
            .transact_write_items(write_request(vec![put_item("user", user_item(1))]))
            .await
            .unwrap();

        let mut key = Item::new();
        key.insert("user_id".to_string(), value::n(1));
        let stored = client.get_item("user", &key).await.unwrap();
        assert_eq!(stored, Some(user_item(1)));
        assert_eq!(client.write_call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_condition_cancels_whole_batch() {
        let client = MemoryTransactClient::new();
        client.create_table("user", "user_id", None);
        client.insert_item("user", user_item(1)).unwrap();

        let mut guarded = put_item("user", user_item(1));
        guarded.fields.insert(
            PARAM_CONDITION_EXPRESSION.to_string(),
            json!("attribute_not_exists(user_id)"),
        );
        let fresh = put_item("user", user_item(2));

        let err = client
            .transact_write_items(write_request(vec![guarded, fresh]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::TransactionCanceled(_)));
        // The passing item must not have been applied either
        assert_eq!(client.item_count("user"), 1);
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_found() {
        let client = MemoryTransactClient::new();
        let err = client
            .transact_write_items(write_request(vec![put_item("nowhere", user_item(1))]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_expression_with_aliases() {
        let client = MemoryTransactClient::new();
        client.create_table("statement", "user_id", None);
        let mut item = user_item(1);
        item.insert("balance".to_string(), value::n(0));
        client.insert_item("statement", item).unwrap();

        let mut fields = OperationArgs::new();
        fields.insert(PARAM_TABLE_NAME.to_string(), json!("statement"));
        fields.insert(PARAM_KEY.to_string(), json!({ "user_id": value::n(1) }));
        fields.insert(
            PARAM_UPDATE_EXPRESSION.to_string(),
            json!("SET #b = :balance"),
        );
        fields.insert(
            PARAM_EXPRESSION_ATTRIBUTE_NAMES.to_string(),
            json!({ "#b": "balance" }),
        );
        fields.insert(
            PARAM_EXPRESSION_ATTRIBUTE_VALUES.to_string(),
            json!({ ":balance": value::n(50) }),
        );

        client
            .transact_write_items(write_request(vec![TransactItem {
                kind: OperationKind::Update,
                fields,
            }]))
            .await
            .unwrap();

        let mut key = Item::new();
        key.insert("user_id".to_string(), value::n(1));
        let stored = client.get_item("statement", &key).await.unwrap().unwrap();
        assert_eq!(stored.get("balance"), Some(&value::n(50)));
    }

    #[tokio::test]
    async fn test_token_replay_and_mismatch() {
        let client = MemoryTransactClient::new();
        client.create_table("user", "user_id", None);

        let mut request = write_request(vec![put_item("user", user_item(1))]);
        request.client_request_token = Some("token-1".to_string());
        client.transact_write_items(request.clone()).await.unwrap();

        // Same token, same payload: idempotent replay succeeds
        client.transact_write_items(request).await.unwrap();

        // Same token, different payload: rejected
        let mut mismatched = write_request(vec![put_item("user", user_item(2))]);
        mismatched.client_request_token = Some("token-1".to_string());
        let err = client.transact_write_items(mismatched).await.unwrap_err();
        assert!(matches!(err, StoreError::IdempotentParameterMismatch(_)));
        assert_eq!(client.item_count("user"), 1);
    }
}
