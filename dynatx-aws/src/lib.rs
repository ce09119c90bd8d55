//! DynamoDB-backed client for dynatx transactions
//!
//! This crate provides [`DynamoTransactClient`], the production
//! implementation of `dynatx_core::TransactClient` over
//! `aws-sdk-dynamodb`.
//!
//! ## Usage
//!
//! ```ignore
//! use dynatx_aws::{DynamoConfig, DynamoTransactClient};
//! use dynatx_transact::WriteTransaction;
//!
//! // Build a client from the shared SDK config
//! let client = DynamoTransactClient::connect(DynamoConfig {
//!     region: Some("us-east-1".to_string()),
//!     ..Default::default()
//! })
//! .await?;
//!
//! let mut transaction = WriteTransaction::new(client);
//! // add operations, then commit
//! ```
//!
//! Retry behavior, credentials, and the HTTP client come from the
//! `aws_config::SdkConfig` the client is built from; this crate only
//! adds per-client region/endpoint/timeout overrides.

pub mod client;
pub mod convert;

// Re-export main types
pub use client::{shared_sdk_config, DynamoConfig, DynamoTransactClient};
pub use convert::{attr_to_value, attrs_to_item, item_to_attrs, value_to_attr};
