//! DynamoDB-backed transact client
//!
//! Implements [`TransactClient`] over `aws-sdk-dynamodb`. The client is
//! built from a shared `SdkConfig` (preserving the HTTP client, retry
//! config, and credential resolution) with per-client overrides for
//! region, endpoint, and operation timeout.

use crate::convert::{attrs_to_item, item_to_attrs, value_to_attr};
use async_trait::async_trait;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types as ddb;
use aws_sdk_dynamodb::Client;
use aws_smithy_types::timeout::TimeoutConfig;
use dynatx_core::wire::{
    OperationArgs, OperationKind, TransactGetRequest, TransactGetResponse, TransactWriteRequest,
    PARAM_CONDITION_EXPRESSION, PARAM_EXPRESSION_ATTRIBUTE_NAMES,
    PARAM_EXPRESSION_ATTRIBUTE_VALUES, PARAM_ITEM, PARAM_KEY, PARAM_PROJECTION_EXPRESSION,
    PARAM_RETURN_VALUES_ON_CONDITION_FAILURE, PARAM_TABLE_NAME, PARAM_UPDATE_EXPRESSION,
};
use dynatx_core::{Item, ItemResponse, StoreError, TransactClient};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Global AWS SDK config cache
///
/// Caches the SDK config to avoid repeated credential resolution; meant
/// to be populated during setup, not under concurrent load.
static SDK_CONFIG: OnceCell<aws_config::SdkConfig> = OnceCell::new();

/// Shared process-wide SDK config, loaded on first use
pub async fn shared_sdk_config() -> &'static aws_config::SdkConfig {
    if let Some(config) = SDK_CONFIG.get() {
        return config;
    }
    let loaded = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    SDK_CONFIG.get_or_init(|| loaded)
}

/// DynamoDB client configuration
#[derive(Debug, Clone, Default)]
pub struct DynamoConfig {
    /// AWS region (optional, uses SDK default if not specified)
    pub region: Option<String>,
    /// Optional endpoint override (e.g. DynamoDB Local)
    pub endpoint: Option<String>,
    /// Operation timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

/// DynamoDB-backed implementation of [`TransactClient`]
#[derive(Clone)]
pub struct DynamoTransactClient {
    client: Client,
}

impl std::fmt::Debug for DynamoTransactClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoTransactClient").finish()
    }
}

impl DynamoTransactClient {
    /// Create a new client from an SDK config with overrides applied
    pub async fn new(
        sdk_config: &aws_config::SdkConfig,
        config: DynamoConfig,
    ) -> Result<Self, StoreError> {
        // Inherit from SdkConfig (preserves HTTP client, retry config,
        // credentials, sleep impl) then apply our overrides
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);

        if let Some(region) = config.region {
            builder = builder.region(Region::new(region));
        }
        if let Some(endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if let Some(timeout_ms) = config.timeout_ms {
            let timeout_config = TimeoutConfig::builder()
                .operation_timeout(Duration::from_millis(timeout_ms))
                .build();
            builder = builder.timeout_config(timeout_config);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
        })
    }

    /// Create a fresh client from the shared process-wide SDK config
    pub async fn connect(config: DynamoConfig) -> Result<Self, StoreError> {
        let sdk_config = shared_sdk_config().await;
        Self::new(sdk_config, config).await
    }

    /// Create from a pre-built client (for testing)
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TransactClient for DynamoTransactClient {
    async fn transact_get_items(
        &self,
        request: TransactGetRequest,
    ) -> Result<TransactGetResponse, StoreError> {
        let mut items = Vec::with_capacity(request.transact_items.len());
        for item in &request.transact_items {
            if item.kind != OperationKind::Get {
                return Err(StoreError::invalid_item(
                    "only Get items are valid in a read transaction",
                ));
            }
            let entry = ddb::TransactGetItem::builder()
                .get(build_get(&item.fields)?)
                .build();
            items.push(entry);
        }

        debug!(items = items.len(), "sending TransactGetItems");
        let mut call = self.client.transact_get_items().set_transact_items(Some(items));
        if let Some(mode) = request.return_consumed_capacity {
            call = call.return_consumed_capacity(ddb::ReturnConsumedCapacity::from(mode.as_str()));
        }
        let output = call
            .send()
            .await
            .map_err(|err| classify("TransactGetItems", err))?;

        let mut responses = Vec::with_capacity(output.responses().len());
        for entry in output.responses() {
            let item = match entry.item() {
                Some(attrs) => Some(attrs_to_item(attrs)?),
                None => None,
            };
            responses.push(ItemResponse { item });
        }
        Ok(TransactGetResponse { responses })
    }

    async fn transact_write_items(&self, request: TransactWriteRequest) -> Result<(), StoreError> {
        let mut items = Vec::with_capacity(request.transact_items.len());
        for item in &request.transact_items {
            let builder = ddb::TransactWriteItem::builder();
            let entry = match item.kind {
                OperationKind::ConditionCheck => {
                    builder.condition_check(build_condition_check(&item.fields)?)
                }
                OperationKind::Delete => builder.delete(build_delete(&item.fields)?),
                OperationKind::Put => builder.put(build_put(&item.fields)?),
                OperationKind::Update => builder.update(build_update(&item.fields)?),
                OperationKind::Get => {
                    return Err(StoreError::invalid_item(
                        "Get is not valid in a write transaction",
                    ))
                }
            };
            items.push(entry.build());
        }

        debug!(items = items.len(), "sending TransactWriteItems");
        let mut call = self
            .client
            .transact_write_items()
            .set_transact_items(Some(items))
            .set_client_request_token(request.client_request_token);
        if let Some(mode) = request.return_consumed_capacity {
            call = call.return_consumed_capacity(ddb::ReturnConsumedCapacity::from(mode.as_str()));
        }
        if let Some(mode) = request.return_item_collection_metrics {
            call = call.return_item_collection_metrics(ddb::ReturnItemCollectionMetrics::from(
                mode.as_str(),
            ));
        }
        call.send()
            .await
            .map_err(|err| classify("TransactWriteItems", err))?;
        Ok(())
    }

    async fn get_item(&self, table_name: &str, key: &Item) -> Result<Option<Item>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(table_name)
            .set_key(Some(item_to_attrs(key)?))
            .consistent_read(true)
            .send()
            .await
            .map_err(|err| classify("GetItem", err))?;

        match output.item() {
            Some(attrs) => Ok(Some(attrs_to_item(attrs)?)),
            None => Ok(None),
        }
    }
}

/// Map an SDK error onto the store error taxonomy by error code
fn classify<E>(operation: &str, err: SdkError<E>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err.code().unwrap_or_default().to_string();
    let message = match err.message() {
        Some(message) => format!("{operation}: {message}"),
        None => format!("{operation} failed: {err}"),
    };
    match code.as_str() {
        "ConditionalCheckFailedException" => StoreError::ConditionFailed(message),
        "TransactionCanceledException" => StoreError::TransactionCanceled(message),
        "IdempotentParameterMismatchException" => StoreError::IdempotentParameterMismatch(message),
        "TransactionInProgressException" => StoreError::TransactionInProgress(message),
        "ResourceNotFoundException" => StoreError::NotFound(message),
        "ProvisionedThroughputExceededException" | "ThrottlingException"
        | "RequestLimitExceeded" => StoreError::Throttled(message),
        "" => StoreError::Io(message),
        _ => StoreError::Other(format!("{code}: {message}")),
    }
}

fn optional_str<'a>(fields: &'a OperationArgs, name: &str) -> Option<&'a str> {
    fields.get(name).and_then(Value::as_str)
}

fn optional_attrs(
    fields: &OperationArgs,
    name: &str,
) -> Result<Option<HashMap<String, ddb::AttributeValue>>, StoreError> {
    match fields.get(name).and_then(Value::as_object) {
        Some(object) => {
            let mut attrs = HashMap::with_capacity(object.len());
            for (key, value) in object {
                attrs.insert(key.clone(), value_to_attr(value)?);
            }
            Ok(Some(attrs))
        }
        None => Ok(None),
    }
}

fn optional_names(
    fields: &OperationArgs,
    name: &str,
) -> Result<Option<HashMap<String, String>>, StoreError> {
    match fields.get(name).and_then(Value::as_object) {
        Some(object) => {
            let mut names_map = HashMap::with_capacity(object.len());
            for (alias, value) in object {
                let resolved = value.as_str().ok_or_else(|| {
                    StoreError::invalid_item(format!("attribute alias {alias} must map to a string"))
                })?;
                names_map.insert(alias.clone(), resolved.to_string());
            }
            Ok(Some(names_map))
        }
        None => Ok(None),
    }
}

fn build_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::invalid_item(err.to_string())
}

fn build_get(fields: &OperationArgs) -> Result<ddb::Get, StoreError> {
    // ExpressionAttributeValues carry no meaning for a get; the SDK's
    // Get shape has no slot for them
    ddb::Get::builder()
        .set_key(optional_attrs(fields, PARAM_KEY)?)
        .set_table_name(optional_str(fields, PARAM_TABLE_NAME).map(String::from))
        .set_projection_expression(optional_str(fields, PARAM_PROJECTION_EXPRESSION).map(String::from))
        .set_expression_attribute_names(optional_names(fields, PARAM_EXPRESSION_ATTRIBUTE_NAMES)?)
        .build()
        .map_err(build_error)
}

fn build_condition_check(fields: &OperationArgs) -> Result<ddb::ConditionCheck, StoreError> {
    ddb::ConditionCheck::builder()
        .set_key(optional_attrs(fields, PARAM_KEY)?)
        .set_table_name(optional_str(fields, PARAM_TABLE_NAME).map(String::from))
        .set_condition_expression(optional_str(fields, PARAM_CONDITION_EXPRESSION).map(String::from))
        .set_expression_attribute_names(optional_names(fields, PARAM_EXPRESSION_ATTRIBUTE_NAMES)?)
        .set_expression_attribute_values(optional_attrs(fields, PARAM_EXPRESSION_ATTRIBUTE_VALUES)?)
        .set_return_values_on_condition_check_failure(
            optional_str(fields, PARAM_RETURN_VALUES_ON_CONDITION_FAILURE)
                .map(ddb::ReturnValuesOnConditionCheckFailure::from),
        )
        .build()
        .map_err(build_error)
}

fn build_delete(fields: &OperationArgs) -> Result<ddb::Delete, StoreError> {
    ddb::Delete::builder()
        .set_key(optional_attrs(fields, PARAM_KEY)?)
        .set_table_name(optional_str(fields, PARAM_TABLE_NAME).map(String::from))
        .set_condition_expression(optional_str(fields, PARAM_CONDITION_EXPRESSION).map(String::from))
        .set_expression_attribute_names(optional_names(fields, PARAM_EXPRESSION_ATTRIBUTE_NAMES)?)
        .set_expression_attribute_values(optional_attrs(fields, PARAM_EXPRESSION_ATTRIBUTE_VALUES)?)
        .set_return_values_on_condition_check_failure(
            optional_str(fields, PARAM_RETURN_VALUES_ON_CONDITION_FAILURE)
                .map(ddb::ReturnValuesOnConditionCheckFailure::from),
        )
        .build()
        .map_err(build_error)
}

fn build_put(fields: &OperationArgs) -> Result<ddb::Put, StoreError> {
    ddb::Put::builder()
        .set_item(optional_attrs(fields, PARAM_ITEM)?)
        .set_table_name(optional_str(fields, PARAM_TABLE_NAME).map(String::from))
        .set_condition_expression(optional_str(fields, PARAM_CONDITION_EXPRESSION).map(String::from))
        .set_expression_attribute_names(optional_names(fields, PARAM_EXPRESSION_ATTRIBUTE_NAMES)?)
        .set_expression_attribute_values(optional_attrs(fields, PARAM_EXPRESSION_ATTRIBUTE_VALUES)?)
        .set_return_values_on_condition_check_failure(
            optional_str(fields, PARAM_RETURN_VALUES_ON_CONDITION_FAILURE)
                .map(ddb::ReturnValuesOnConditionCheckFailure::from),
        )
        .build()
        .map_err(build_error)
}

fn build_update(fields: &OperationArgs) -> Result<ddb::Update, StoreError> {
    ddb::Update::builder()
        .set_key(optional_attrs(fields, PARAM_KEY)?)
        .set_table_name(optional_str(fields, PARAM_TABLE_NAME).map(String::from))
        .set_update_expression(optional_str(fields, PARAM_UPDATE_EXPRESSION).map(String::from))
        .set_condition_expression(optional_str(fields, PARAM_CONDITION_EXPRESSION).map(String::from))
        .set_expression_attribute_names(optional_names(fields, PARAM_EXPRESSION_ATTRIBUTE_NAMES)?)
        .set_expression_attribute_values(optional_attrs(fields, PARAM_EXPRESSION_ATTRIBUTE_VALUES)?)
        .set_return_values_on_condition_check_failure(
            optional_str(fields, PARAM_RETURN_VALUES_ON_CONDITION_FAILURE)
                .map(ddb::ReturnValuesOnConditionCheckFailure::from),
        )
        .build()
        .map_err(build_error)
}
