use crate::dynamodb::{condition, expression, key, write};

use aws_sdk_dynamodb::{Client, error, operation, types};
use serde::Serialize;
use serde_dynamo::{Error, Result};

/// delete item operation
#[derive(Debug, PartialEq)]
struct DeleteItemInput {
    keys: expression::AttributeValues,
    return_values: Option<types::ReturnValue>,
    write_operation: write::common::WriteInput,
}

/// Delete item operation.
///
/// Deleting a key with no item succeeds without changing anything.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use aws_utils::dynamodb::{key, write};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let delete_item = write::delete_item::DeleteItem::new("users", key::Keys::partition("id", "1"));
/// delete_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq)]
pub struct DeleteItem<P, S = P, C = P> {
    /// Condition the existing item must satisfy for the delete to succeed.
    pub condition: Option<condition::Condition<C>>,
    /// The primary key of the item to delete.
    pub keys: key::Keys<P, S>,
    /// Attributes of the deleted item to return in the output.
    pub return_values: Option<types::ReturnValue>,
    /// The name of the table to delete from.
    pub table_name: String,
}

impl<P, S> DeleteItem<P, S> {
    /// Delete the item identified by `keys` from `table_name`.
    pub fn new(table_name: impl Into<String>, keys: key::Keys<P, S>) -> Self {
        Self {
            condition: None,
            keys,
            return_values: None,
            table_name: table_name.into(),
        }
    }
}

impl<P, S, C> DeleteItem<P, S, C> {
    /// Only delete when `condition` holds.
    pub fn with_condition<D>(self, condition: condition::Condition<D>) -> DeleteItem<P, S, D> {
        DeleteItem {
            condition: Some(condition),
            keys: self.keys,
            return_values: self.return_values,
            table_name: self.table_name,
        }
    }
}

impl<P: Serialize, S: Serialize, C: Serialize> TryFrom<DeleteItem<P, S, C>> for DeleteItemInput {
    type Error = Error;

    fn try_from(delete_item: DeleteItem<P, S, C>) -> Result<Self> {
        let operation = Self {
            keys: delete_item.keys.try_into()?,
            return_values: delete_item.return_values,
            write_operation: write::common::WriteInput::new(
                delete_item.table_name,
                delete_item.condition,
            )?,
        };
        Ok(operation)
    }
}

impl<P: Serialize, S: Serialize, C: Serialize> DeleteItem<P, S, C> {
    /// Execute the delete item operation.
    #[tracing::instrument(
        name = "aws_utils.dynamodb.delete_item",
        skip_all,
        fields(table = %self.table_name),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::delete_item::DeleteItemOutput,
        error::SdkError<operation::delete_item::DeleteItemError>,
    > {
        let delete_item: DeleteItemInput = self.try_into().map_err(error::BuildError::other)?;
        let builder = client
            .delete_item()
            .set_key(Some(delete_item.keys))
            .set_return_values(delete_item.return_values);
        write::common::apply_write_input!(builder, delete_item.write_operation)
            .send()
            .await
    }
}
