//! Transactional batch operations for DynamoDB-compatible stores
//!
//! This crate is the transaction-batching layer of the dynatx client:
//! it accumulates per-item operations under a single logical
//! transaction, enforces the store's structural limits (at most ten
//! items, one operation per item identity), projects each operation
//! onto its field whitelist, and commits the batch as one wire request.
//!
//! Two transaction kinds share the accumulation machinery by
//! composition:
//!
//! - [`ReadTransaction`]: consistent multi-item reads. Each `get`
//!   returns a [`ResultSlot`] that resolves when the transaction
//!   commits.
//! - [`WriteTransaction`]: atomic multi-item writes (condition check,
//!   delete, put, update). Put and update register an
//!   [`EntityHandle`](dynatx_core::EntityHandle) that is refreshed from
//!   the store after a successful commit.
//!
//! [`scoped`] provides commit-on-scope-exit semantics over either kind.
//!
//! # Example
//!
//! ```ignore
//! use dynatx_core::{EntityHandle, KeyValue, MemoryTransactClient};
//! use dynatx_transact::{scoped, WriteTransaction};
//!
//! let client = MemoryTransactClient::new();
//! let statement = EntityHandle::new(statement);
//!
//! scoped(WriteTransaction::new(client), |transaction| {
//!     transaction.put(&statement, args.clone())?;
//!     transaction.condition_check::<User>(KeyValue::n(1), None, check_args)
//! })
//! .await?;
//! ```

mod batch;
pub mod error;
pub mod format;
pub mod identity;
pub mod read;
pub mod scope;
pub mod write;

pub use error::{Result, TransactError};
pub use format::format_transact_item;
pub use identity::{EntityKey, IdentitySet};
pub use read::{ReadOptions, ReadTransaction, ResultSlot};
pub use scope::{scoped, Commit};
pub use write::{WriteOptions, WriteTransaction};
