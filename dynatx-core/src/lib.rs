//! Core abstractions for dynatx
//!
//! This crate provides the building blocks the transaction layer
//! (`dynatx-transact`) is written against:
//!
//! - [`value`]: DynamoDB-typed JSON attribute values and [`KeyValue`]
//! - [`wire`]: request/response documents and per-operation field
//!   whitelists
//! - [`Entity`]: the object-mapping seam (table, keys, item conversion)
//! - [`TransactClient`]: the network-client seam with the two
//!   transactional RPCs plus single-item reads for post-commit refresh
//! - [`MemoryTransactClient`]: in-memory implementation for testing
//!
//! The DynamoDB-backed client lives in `dynatx-aws`.

pub mod client;
pub mod entity;
pub mod error;
pub mod memory;
pub mod value;
pub mod wire;

// Re-export main types
pub use client::TransactClient;
pub use entity::{Entity, EntityHandle};
pub use error::{Result, StoreError};
pub use memory::MemoryTransactClient;
pub use value::{Item, KeyValue};
pub use wire::{
    ItemResponse, OperationArgs, OperationKind, ReturnConsumedCapacity,
    ReturnItemCollectionMetrics, TransactGetRequest, TransactGetResponse, TransactItem,
    TransactWriteRequest, MAX_CLIENT_REQUEST_TOKEN_LEN, MAX_TRANSACT_ITEMS,
};
