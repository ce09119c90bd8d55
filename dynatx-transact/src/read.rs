//! Read transactions
//!
//! A [`ReadTransaction`] accumulates get operations and hands back one
//! [`ResultSlot`] per operation. Slots stay unresolved until the
//! transaction commits; reading one earlier is an error, never an empty
//! value. On commit the batched read is issued and each slot is
//! hydrated from the response entry at the same position.

use crate::batch::TransactionBatch;
use crate::error::{Result, TransactError};
use crate::format::format_transact_item;
use crate::identity::EntityKey;
use dynatx_core::wire::{
    OperationArgs, OperationKind, ReturnConsumedCapacity, TransactGetRequest, PARAM_KEY,
    PARAM_TABLE_NAME,
};
use dynatx_core::{Entity, Item, KeyValue, TransactClient};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Options shared by every operation of one read transaction
#[derive(Clone, Copy, Debug, Default)]
pub struct ReadOptions {
    /// Optional consumed-capacity reporting mode
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
}

#[derive(Debug)]
enum SlotState<M> {
    Pending,
    Ready(Option<M>),
}

/// Placeholder for one item of a read transaction
///
/// `Ready(None)` means the store holds no item for the requested key.
#[derive(Debug)]
pub struct ResultSlot<M> {
    state: Arc<RwLock<SlotState<M>>>,
}

impl<M> Clone for ResultSlot<M> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<M: Entity> ResultSlot<M> {
    fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SlotState::Pending)),
        }
    }

    /// Whether the owning transaction has committed
    pub fn is_ready(&self) -> bool {
        matches!(*self.state.read(), SlotState::Ready(_))
    }

    /// The hydrated entity, or `None` if the store had no such item
    ///
    /// Fails with [`TransactError::ResultNotReady`] until the owning
    /// transaction has committed successfully.
    pub fn get(&self) -> Result<Option<M>> {
        match &*self.state.read() {
            SlotState::Pending => Err(TransactError::ResultNotReady),
            SlotState::Ready(entity) => Ok(entity.clone()),
        }
    }

    fn resolve(&self, item: Option<&Item>) -> Result<()> {
        let entity = match item {
            Some(item) => Some(M::from_item(item)?),
            None => None,
        };
        *self.state.write() = SlotState::Ready(entity);
        Ok(())
    }
}

/// Type-erased hydration of one slot from its response entry
trait Hydrate: Send {
    fn hydrate(&self, item: Option<&Item>) -> Result<()>;
}

struct SlotHydrator<M> {
    slot: ResultSlot<M>,
}

impl<M: Entity> Hydrate for SlotHydrator<M> {
    fn hydrate(&self, item: Option<&Item>) -> Result<()> {
        self.slot.resolve(item)
    }
}

/// A transaction of up to ten consistent get operations
pub struct ReadTransaction<C> {
    batch: TransactionBatch<C>,
    slots: Vec<Box<dyn Hydrate>>,
}

impl<C: TransactClient> ReadTransaction<C> {
    /// Create an empty read transaction against `client`
    pub fn new(client: C) -> Self {
        Self::with_options(client, ReadOptions::default())
    }

    /// Create an empty read transaction with explicit options
    pub fn with_options(client: C, options: ReadOptions) -> Self {
        Self {
            batch: TransactionBatch::new(client, options.return_consumed_capacity),
            slots: Vec::new(),
        }
    }

    /// Add a get operation for the entity with the given keys
    ///
    /// Returns the result slot bound to this operation's position.
    pub fn get<M: Entity>(
        &mut self,
        hash_key: KeyValue,
        range_key: Option<KeyValue>,
    ) -> Result<ResultSlot<M>> {
        self.get_with(hash_key, range_key, OperationArgs::new())
    }

    /// Add a get operation with extra arguments
    ///
    /// `extra` may carry a superset of fields (projection expression,
    /// attribute-name aliases, ...); anything outside the get whitelist
    /// is dropped.
    pub fn get_with<M: Entity>(
        &mut self,
        hash_key: KeyValue,
        range_key: Option<KeyValue>,
        extra: OperationArgs,
    ) -> Result<ResultSlot<M>> {
        let identity = EntityKey::of::<M>(hash_key.clone(), range_key.clone());

        let mut args = extra;
        args.insert(
            PARAM_KEY.to_string(),
            Value::Object(M::key_item(&hash_key, range_key.as_ref())),
        );
        args.insert(
            PARAM_TABLE_NAME.to_string(),
            Value::String(M::table_name().to_string()),
        );

        self.batch
            .add(identity, format_transact_item(OperationKind::Get, args))?;

        let slot = ResultSlot::new();
        self.slots.push(Box::new(SlotHydrator { slot: slot.clone() }));
        Ok(slot)
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

    /// Issue the batched read and hydrate every slot, in request order
    ///
    /// An empty transaction is a valid degenerate case and still issues
    /// the call. On failure no slot is populated and reads of them keep
    /// failing with [`TransactError::ResultNotReady`].
    pub async fn commit(self) -> Result<()> {
        let ReadTransaction { batch, slots } = self;
        let (client, transact_items, return_consumed_capacity) = batch.into_parts();

        debug!(items = transact_items.len(), "committing read transaction");
        let response = client
            .transact_get_items(TransactGetRequest {
                transact_items,
                return_consumed_capacity,
            })
            .await?;

        if response.responses.len() != slots.len() {
            return Err(TransactError::ResponseMismatch {
                expected: slots.len(),
                actual: response.responses.len(),
            });
        }
        for (slot, entry) in slots.iter().zip(response.responses.iter()) {
            slot.hydrate(entry.item.as_ref())?;
        }
        Ok(())
    }
}
