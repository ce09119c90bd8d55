//! Network-client trait for the transactional RPCs
//!
//! Transactions are generic over [`TransactClient`] so the same
//! accumulation and commit logic runs against the in-memory client in
//! tests and the DynamoDB-backed client in production (`dynatx-aws`).
//! Retry, backoff, and connection pooling are the implementation's
//! concern, never the transaction layer's.

use crate::error::Result;
use crate::value::Item;
use crate::wire::{TransactGetRequest, TransactGetResponse, TransactWriteRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Client for a key-value store with multi-item atomic operations
#[async_trait]
pub trait TransactClient: Send + Sync {
    /// Read up to [`crate::wire::MAX_TRANSACT_ITEMS`] items consistently
    ///
    /// The response carries one entry per requested item, in request
    /// order.
    async fn transact_get_items(&self, request: TransactGetRequest)
        -> Result<TransactGetResponse>;

    /// Apply a batch of write operations atomically
    ///
    /// Either every operation applies or none does; a rejection surfaces
    /// as an error with no per-item response body.
    async fn transact_write_items(&self, request: TransactWriteRequest) -> Result<()>;

    /// Consistently read a single item by primary key
    ///
    /// Used by write transactions to refresh mutated entities after a
    /// successful commit.
    async fn get_item(&self, table_name: &str, key: &Item) -> Result<Option<Item>>;
}

#[async_trait]
impl<T: TransactClient + ?Sized> TransactClient for Arc<T> {
    async fn transact_get_items(
        &self,
        request: TransactGetRequest,
    ) -> Result<TransactGetResponse> {
        (**self).transact_get_items(request).await
    }

    async fn transact_write_items(&self, request: TransactWriteRequest) -> Result<()> {
        (**self).transact_write_items(request).await
    }

    async fn get_item(&self, table_name: &str, key: &Item) -> Result<Option<Item>> {
        (**self).get_item(table_name, key).await
    }
}
