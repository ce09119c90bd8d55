//! Scoped commit
//!
//! [`scoped`] runs a block of operations against a transaction and then
//! commits, whatever the block's outcome - mirroring resource-scope
//! semantics where leaving the scope always commits. A commit error
//! supersedes a block error; otherwise the block error propagates.
//!
//! Because `commit` consumes the transaction, committing twice is a
//! compile error rather than a runtime guard.

use crate::error::Result;
use crate::read::ReadTransaction;
use crate::write::WriteTransaction;
use async_trait::async_trait;
use dynatx_core::TransactClient;

/// Capability to commit an accumulated transaction exactly once
#[async_trait]
pub trait Commit: Sized + Send {
    /// Issue the batched request and run post-commit processing
    async fn commit(self) -> Result<()>;
}

#[async_trait]
impl<C: TransactClient> Commit for ReadTransaction<C> {
    async fn commit(self) -> Result<()> {
        ReadTransaction::commit(self).await
    }
}

#[async_trait]
impl<C: TransactClient> Commit for WriteTransaction<C> {
    async fn commit(self) -> Result<()> {
        WriteTransaction::commit(self).await
    }
}

/// Run `body` against the transaction, then commit it
///
/// The commit runs on every exit path of the body, including failure.
/// Error precedence: a commit error wins over a body error.
pub async fn scoped<X, T, F>(mut transaction: X, body: F) -> Result<T>
where
    X: Commit,
    F: FnOnce(&mut X) -> Result<T>,
{
    let outcome = body(&mut transaction);
    let committed = transaction.commit().await;
    match (outcome, committed) {
        (Ok(value), Ok(())) => Ok(value),
        (_, Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
    }
}
