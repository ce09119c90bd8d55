//! Write transactions
//!
//! A [`WriteTransaction`] accumulates condition-check, delete, put, and
//! update operations and commits them as one atomic batch. Put and
//! update register the caller's [`EntityHandle`] and refresh it from
//! the store after a successful commit; a rejected batch refreshes
//! nothing - the store applies all items or none.

use crate::batch::TransactionBatch;
use crate::error::{Result, TransactError};
use crate::format::format_transact_item;
use crate::identity::EntityKey;
use async_trait::async_trait;
use dynatx_core::wire::{
    OperationArgs, OperationKind, ReturnConsumedCapacity, ReturnItemCollectionMetrics,
    TransactWriteRequest, MAX_CLIENT_REQUEST_TOKEN_LEN, PARAM_CONDITION_EXPRESSION, PARAM_ITEM,
    PARAM_KEY, PARAM_TABLE_NAME, PARAM_UPDATE_EXPRESSION,
};
use dynatx_core::{Entity, EntityHandle, Item, KeyValue, StoreError, TransactClient};
use serde_json::Value;
use tracing::debug;

/// Options for one write transaction
///
/// The idempotency token is validated at construction, before any
/// network interaction.
#[derive(Clone, Debug, Default)]
pub struct WriteOptions {
    /// Optional idempotency token, at most 36 characters
    pub client_request_token: Option<String>,
    /// Optional consumed-capacity reporting mode
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
    /// Optional item-collection-metrics reporting mode
    pub return_item_collection_metrics: Option<ReturnItemCollectionMetrics>,
}

/// Type-erased post-commit refresh of one mutated entity
#[async_trait]
trait Refresh<C>: Send + Sync {
    async fn refresh(&self, client: &C) -> Result<()>;
}

struct HandleRefresh<M> {
    handle: EntityHandle<M>,
    table: &'static str,
    key: Item,
}

#[async_trait]
impl<M: Entity, C: TransactClient> Refresh<C> for HandleRefresh<M> {
    async fn refresh(&self, client: &C) -> Result<()> {
        let item = client
            .get_item(self.table, &self.key)
            .await?
            .ok_or_else(|| {
                StoreError::not_found(format!("{} item missing after commit", self.table))
            })?;
        self.handle.replace(M::from_item(&item)?);
        Ok(())
    }
}

/// A transaction of up to ten atomic write operations
pub struct WriteTransaction<C> {
    batch: TransactionBatch<C>,
    client_request_token: Option<String>,
    return_item_collection_metrics: Option<ReturnItemCollectionMetrics>,
    refreshers: Vec<Box<dyn Refresh<C>>>,
}

impl<C> std::fmt::Debug for WriteTransaction<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteTransaction")
            .field("client_request_token", &self.client_request_token)
            .field(
                "return_item_collection_metrics",
                &self.return_item_collection_metrics,
            )
            .field("refreshers", &self.refreshers.len())
            .finish()
    }
}

impl<C: TransactClient> WriteTransaction<C> {
    /// Create an empty write transaction against `client`
    pub fn new(client: C) -> Self {
        Self {
            batch: TransactionBatch::new(client, None),
            client_request_token: None,
            return_item_collection_metrics: None,
            refreshers: Vec::new(),
        }
    }

    /// Create an empty write transaction with explicit options
    ///
    /// Fails fast with
    /// [`TransactError::InvalidClientRequestToken`] if the token is
    /// longer than [`MAX_CLIENT_REQUEST_TOKEN_LEN`].
    pub fn with_options(client: C, options: WriteOptions) -> Result<Self> {
        if let Some(token) = &options.client_request_token {
            if token.len() > MAX_CLIENT_REQUEST_TOKEN_LEN {
                return Err(TransactError::InvalidClientRequestToken {
                    len: token.len(),
                    max: MAX_CLIENT_REQUEST_TOKEN_LEN,
                });
            }
        }
        Ok(Self {
            batch: TransactionBatch::new(client, options.return_consumed_capacity),
            client_request_token: options.client_request_token,
            return_item_collection_metrics: options.return_item_collection_metrics,
            refreshers: Vec::new(),
        })
    }

    /// Assert a condition against an item without mutating it
    ///
    /// `args` must carry a `ConditionExpression`. No handle is
    /// registered; the entity is untouched by the commit.
    pub fn condition_check<M: Entity>(
        &mut self,
        hash_key: KeyValue,
        range_key: Option<KeyValue>,
        args: OperationArgs,
    ) -> Result<()> {
        if !args.contains_key(PARAM_CONDITION_EXPRESSION) {
            return Err(TransactError::MissingConditionExpression);
        }
        let identity = EntityKey::of::<M>(hash_key.clone(), range_key.clone());
        let mut args = args;
        args.insert(
            PARAM_KEY.to_string(),
            Value::Object(M::key_item(&hash_key, range_key.as_ref())),
        );
        args.insert(
            PARAM_TABLE_NAME.to_string(),
            Value::String(M::table_name().to_string()),
        );
        self.batch
            .add(identity, format_transact_item(OperationKind::ConditionCheck, args))
    }

    /// Delete the item the entity resolves to
    ///
    /// No handle is registered - after commit the entity no longer
    /// exists in the store.
    pub fn delete<M: Entity>(&mut self, entity: &M, args: OperationArgs) -> Result<()> {
        let identity = EntityKey::for_entity(entity);
        let mut args = args;
        args.insert(PARAM_KEY.to_string(), Value::Object(entity.key_attributes()));
        args.insert(
            PARAM_TABLE_NAME.to_string(),
            Value::String(M::table_name().to_string()),
        );
        self.batch
            .add(identity, format_transact_item(OperationKind::Delete, args))
    }

    /// Create or replace the item behind the handle
    ///
    /// The handle is refreshed from the store after a successful
    /// commit.
    pub fn put<M: Entity>(&mut self, handle: &EntityHandle<M>, args: OperationArgs) -> Result<()> {
        let entity = handle.snapshot();
        let identity = EntityKey::for_entity(&entity);
        let mut args = args;
        args.insert(PARAM_ITEM.to_string(), Value::Object(entity.to_item()));
        args.insert(
            PARAM_TABLE_NAME.to_string(),
            Value::String(M::table_name().to_string()),
        );
        self.batch
            .add(identity, format_transact_item(OperationKind::Put, args))?;
        self.refreshers.push(Box::new(HandleRefresh {
            handle: handle.clone(),
            table: M::table_name(),
            key: entity.key_attributes(),
        }));
        Ok(())
    }

    /// Apply an update expression to the item behind the handle
    ///
    /// `args` must carry an `UpdateExpression`. The handle is refreshed
    /// from the store after a successful commit.
    pub fn update<M: Entity>(
        &mut self,
        handle: &EntityHandle<M>,
        args: OperationArgs,
    ) -> Result<()> {
        if !args.contains_key(PARAM_UPDATE_EXPRESSION) {
            return Err(TransactError::MissingUpdateExpression);
        }
        let entity = handle.snapshot();
        let identity = EntityKey::for_entity(&entity);
        let mut args = args;
        args.insert(PARAM_KEY.to_string(), Value::Object(entity.key_attributes()));
        args.insert(
            PARAM_TABLE_NAME.to_string(),
            Value::String(M::table_name().to_string()),
        );
        self.batch
            .add(identity, format_transact_item(OperationKind::Update, args))?;
        self.refreshers.push(Box::new(HandleRefresh {
            handle: handle.clone(),
            table: M::table_name(),
            key: entity.key_attributes(),
        }));
        Ok(())
    }

    /// Number of accumulated operations
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    /// Whether no operation has been added yet
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Read-only view of the accumulated transact items
    pub fn items(&self) -> &[dynatx_core::TransactItem] {
        self.batch.items()
    }

    /// Issue the batched write, then refresh every registered handle
    ///
    /// A store rejection propagates unchanged and refreshes nothing -
    /// the batch applied atomically or not at all.
    pub async fn commit(self) -> Result<()> {
        let WriteTransaction {
            batch,
            client_request_token,
            return_item_collection_metrics,
            refreshers,
        } = self;
        let (client, transact_items, return_consumed_capacity) = batch.into_parts();

        debug!(
            items = transact_items.len(),
            handles = refreshers.len(),
            "committing write transaction"
        );
        client
            .transact_write_items(TransactWriteRequest {
                transact_items,
                client_request_token,
                return_consumed_capacity,
                return_item_collection_metrics,
            })
            .await?;

        for refresher in &refreshers {
            refresher.refresh(&client).await?;
        }
        Ok(())
    }
}
