//! Error types for dynatx-core

use thiserror::Error;

/// Result type alias using our StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Store-level errors
///
/// Covers everything the store (or the client talking to it) can report
/// back. These are surfaced to callers unchanged; the transaction layer
/// never interprets or retries them.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A condition expression evaluated to false
    #[error("Condition failed: {0}")]
    ConditionFailed(String),

    /// The store canceled the whole transaction (no item was applied)
    #[error("Transaction canceled: {0}")]
    TransactionCanceled(String),

    /// A client request token was reused with a different payload
    #[error("Idempotent parameter mismatch: {0}")]
    IdempotentParameterMismatch(String),

    /// A transaction with the same token is still in flight
    #[error("Transaction in progress: {0}")]
    TransactionInProgress(String),

    /// Resource not found (missing table, missing item on refresh)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Throttled - rate limited by the store
    #[error("Throttled: {0}")]
    Throttled(String),

    /// An item or request document was structurally invalid
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O or network error
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization error (serde_json)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Create a condition-failed error
    pub fn condition_failed(msg: impl Into<String>) -> Self {
        StoreError::ConditionFailed(msg.into())
    }

    /// Create a transaction-canceled error
    pub fn transaction_canceled(msg: impl Into<String>) -> Self {
        StoreError::TransactionCanceled(msg.into())
    }

    /// Create an idempotent-parameter-mismatch error
    pub fn idempotent_mismatch(msg: impl Into<String>) -> Self {
        StoreError::IdempotentParameterMismatch(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        StoreError::NotFound(msg.into())
    }

    /// Create a throttled error
    pub fn throttled(msg: impl Into<String>) -> Self {
        StoreError::Throttled(msg.into())
    }

    /// Create an invalid-item error
    pub fn invalid_item(msg: impl Into<String>) -> Self {
        StoreError::InvalidItem(msg.into())
    }

    /// Create an invalid-configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        StoreError::InvalidConfig(msg.into())
    }

    /// Create an I/O error
    pub fn io(msg: impl Into<String>) -> Self {
        StoreError::Io(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        StoreError::Other(msg.into())
    }
}
