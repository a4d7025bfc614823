#![deny(missing_docs)]

//! # AWS utils
//!
//! Thin, typed helpers over the AWS SDK clients for DynamoDB, S3, SNS, SQS and Cognito,
//! plus a LocalStack harness for tests.
//!
//! ## Overview
//!
//! Every service module has two layers:
//! - operation structs (`dynamodb::read::query::Query`, [`s3::PutObject`], ...) with
//!   public fields and a `send(&Client)` method returning the SDK error untouched
//! - functions running those operations on the process-wide [`session`] and returning
//!   [`Result`], with items converted through `serde`
//!
//! DynamoDB expressions are built from structured types; placeholders are generated, so
//! attribute names never need escaping.
//!
//! ## Quick Example
//!
//! ```no_run
//! use aws_utils::dynamodb::{self, key, key_condition};
//! use aws_utils::{Error, session};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize, Serialize)]
//! struct Order {
//!     customer: String,
//!     id: u32,
//!     status: String,
//! }
//!
//! # async fn example() -> aws_utils::Result<()> {
//! session::init(session::SessionConfig::from_env()).await;
//!
//! dynamodb::put_item(
//!     "orders",
//!     Order {
//!         customer: "john".to_string(),
//!         id: 1,
//!         status: "created".to_string(),
//!     },
//! )
//! .await?;
//! dynamodb::update_item(
//!     "orders",
//!     key::Keys::composite("customer", "john", "id", 1),
//!     [("status", "paid")],
//! )
//! .await?;
//! let recent: Vec<Order> = dynamodb::query(
//!     "orders",
//!     key_condition::KeyCondition::partition("customer", "john")
//!         .with_sort_key("id", key_condition::Comparison::GreaterThanOrEqual(1)),
//! )
//! .await?;
//! match dynamodb::get_item::<Order, _, _>("orders", key::Keys::composite("customer", "jane", "id", 7)).await {
//!     Err(Error::ItemNotFound) => {}
//!     other => {
//!         other?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@session`] - Process-wide AWS configuration and clients
//! - [`mod@dynamodb`] - Keys, expressions, operations and item helpers
//! - [`mod@s3`], [`mod@sns`], [`mod@sqs`], [`mod@cognito`] - Other services
//! - [`mod@localstack`] - Local emulator harness for tests

mod error;

pub use error::{Error, Result};

pub mod cognito;

pub mod dynamodb;

pub mod localstack;

pub mod s3;

pub mod session;

pub mod sns;

pub mod sqs;
