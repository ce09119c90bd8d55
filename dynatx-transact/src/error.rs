//! Error types for dynatx-transact

use dynatx_core::StoreError;
use thiserror::Error;

/// Result type alias using our TransactError
pub type Result<T> = std::result::Result<T, TransactError>;

/// Transaction-layer errors
///
/// Everything except `Store` is raised locally, before any network
/// call. Store errors pass through from the client unchanged.
#[derive(Error, Debug)]
pub enum TransactError {
    /// A second operation targeted an identity already in this transaction
    #[error("duplicate operation on a {entity} key within one transaction")]
    DuplicateItem {
        /// Type name of the offending entity
        entity: &'static str,
    },

    /// The transaction already holds the maximum number of items
    #[error("transaction already holds the maximum of {max} items")]
    TooManyItems {
        /// The store's per-transaction item ceiling
        max: usize,
    },

    /// The client request token exceeds the allowed length
    #[error("client request token must be at most {max} characters, got {len}")]
    InvalidClientRequestToken {
        /// Length of the rejected token
        len: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// A condition check was added without a condition expression
    #[error("condition check requires a ConditionExpression")]
    MissingConditionExpression,

    /// An update was added without an update expression
    #[error("update requires an UpdateExpression")]
    MissingUpdateExpression,

    /// A result slot was read before the transaction committed
    #[error("transaction result read before commit")]
    ResultNotReady,

    /// The store returned a response sequence of the wrong length
    #[error("store returned {actual} responses for {expected} requested items")]
    ResponseMismatch {
        /// Number of items requested
        expected: usize,
        /// Number of responses received
        actual: usize,
    },

    /// Store-level error, propagated verbatim
    #[error(transparent)]
    Store(#[from] StoreError),
}
