use crate::dynamodb::key;

use aws_sdk_dynamodb::{Client, error, operation, types};
use serde::Serialize;
use serde_dynamo::{Error, Result};
use std::collections;

/// get item operation
#[derive(Clone, Debug, Default, PartialEq)]
struct GetItemInput {
    consistent_read: Option<bool>,
    keys: collections::HashMap<String, types::AttributeValue>,
    table_name: String,
}

/// Get item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use aws_utils::dynamodb::{key, read};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let get_item = read::get_item::GetItem::new("cities", key::Keys::composite("State", "NJ", "Id", 1));
/// let output = get_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetItem<P, S = P> {
    /// Whether to use a strongly consistent read.
    pub consistent_read: Option<bool>,
    /// The primary key of the item to retrieve.
    pub keys: key::Keys<P, S>,
    /// The name of the table to read from.
    pub table_name: String,
}

impl<P, S> GetItem<P, S> {
    /// Get the item identified by `keys` from `table_name`.
    pub fn new(table_name: impl Into<String>, keys: key::Keys<P, S>) -> Self {
        Self {
            consistent_read: None,
            keys,
            table_name: table_name.into(),
        }
    }
}

impl<P: Serialize, S: Serialize> TryFrom<GetItem<P, S>> for GetItemInput {
    type Error = Error;

    fn try_from(get_item: GetItem<P, S>) -> Result<Self> {
        let operation = Self {
            consistent_read: get_item.consistent_read,
            keys: get_item.keys.try_into()?,
            table_name: get_item.table_name,
        };
        Ok(operation)
    }
}

impl<P: Serialize, S: Serialize> GetItem<P, S> {
    /// Execute the get item operation.
    #[tracing::instrument(
        name = "aws_utils.dynamodb.get_item",
        skip_all,
        fields(table = %self.table_name),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::get_item::GetItemOutput,
        error::SdkError<operation::get_item::GetItemError>,
    > {
        let get_item: GetItemInput = self.try_into().map_err(error::BuildError::other)?;
        client
            .get_item()
            .set_consistent_read(get_item.consistent_read)
            .set_key(Some(get_item.keys))
            .table_name(get_item.table_name)
            .send()
            .await
    }
}
