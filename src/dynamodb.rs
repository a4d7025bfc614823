//! DynamoDB helpers.
//!
//! Operation structs live in [`read`] and [`write`] and return the SDK error verbatim.
//! The functions of this module run them on the process-wide [`session`] and convert
//! items from and into any `serde` type.
//!
//! ```rust,no_run
//! use aws_utils::dynamodb::{self, key, key_condition};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct City {
//!     name: String,
//! }
//!
//! # async fn example() -> aws_utils::Result<()> {
//! let city: City = dynamodb::get_item("cities", key::Keys::composite("State", "NJ", "Id", 1)).await?;
//! let cities: Vec<City> = dynamodb::query(
//!     "cities",
//!     key_condition::KeyCondition::partition("State", "NJ")
//!         .with_sort_key("Id", key_condition::Comparison::Between(1, 10)),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

/// Condition expressions for conditional writes.
pub mod condition;

pub(crate) mod expression;

/// Primary key types.
pub mod key;

pub mod key_condition;

/// Read operations.
pub mod read;

/// Update expressions.
pub mod update;

/// Write operations.
pub mod write;

use crate::{Error, Result, session};

use serde::{Serialize, de::DeserializeOwned};

/// Get the item identified by `keys`.
///
/// Fails with [`Error::ItemNotFound`] when the table holds no such item.
pub async fn get_item<T, P, S>(table_name: &str, keys: key::Keys<P, S>) -> Result<T>
where
    T: DeserializeOwned,
    P: Serialize,
    S: Serialize,
{
    let client = session::get().await.dynamodb();
    let output = read::get_item::GetItem::new(table_name, keys)
        .send(&client)
        .await
        .map_err(aws_sdk_dynamodb::Error::from)?;
    found_item(output.item)
}

/// Find the single item of `index_name` matching `keys`.
///
/// The partition key must match and, when given, the sort key must be equal. Fails with
/// [`Error::ItemNotFound`] on no match and [`Error::MultipleItemsFound`] on several.
pub async fn find_one_from_index<T, P, S>(
    table_name: &str,
    index_name: &str,
    keys: key::Keys<P, S>,
) -> Result<T>
where
    T: DeserializeOwned,
    P: Serialize,
    S: Serialize,
{
    let key_condition = key_condition::KeyCondition::from(keys).with_index_name(index_name);
    let items = query_items(table_name, key_condition).await?;
    single_item(items).inspect_err(|error| {
        if matches!(error, Error::MultipleItemsFound) {
            tracing::debug!(index = index_name, "expected a single item");
        }
    })
}

/// Create `item`, replacing any item with the same primary key.
pub async fn put_item<T: Serialize>(table_name: &str, item: T) -> Result<()> {
    let client = session::get().await.dynamodb();
    write::put_item::PutItem::new(table_name, item)
        .send(&client)
        .await
        .map_err(aws_sdk_dynamodb::Error::from)?;
    Ok(())
}

/// Create `item` only when `condition` holds.
///
/// A failed condition surfaces as `ConditionalCheckFailedException` in
/// [`Error::DynamoDb`].
pub async fn put_item_with_condition<T, C>(
    table_name: &str,
    item: T,
    condition: condition::Condition<C>,
) -> Result<()>
where
    T: Serialize,
    C: Serialize,
{
    let client = session::get().await.dynamodb();
    write::put_item::PutItem::new(table_name, item)
        .with_condition(condition)
        .send(&client)
        .await
        .map_err(aws_sdk_dynamodb::Error::from)?;
    Ok(())
}

/// Set every field of the existing item identified by `keys`.
///
/// The update is conditioned on the item existing, so it never creates one. No fields is
/// an [`Error::InvalidArgument`].
pub async fn update_item<P, S, K, V>(
    table_name: &str,
    keys: key::Keys<P, S>,
    fields: impl IntoIterator<Item = (K, V)>,
) -> Result<()>
where
    P: Serialize,
    S: Serialize,
    K: Into<String>,
    V: Serialize,
{
    let update = update::UpdateExpression::assign(fields);
    if update.is_empty() {
        return Err(Error::InvalidArgument(
            "update fields cannot be empty".to_string(),
        ));
    }
    let client = session::get().await.dynamodb();
    let exists = condition::Condition::Exists(keys.partition_key.name.clone());
    write::update_item::UpdateItem::new(table_name, keys, update)
        .with_condition(exists)
        .send(&client)
        .await
        .map_err(aws_sdk_dynamodb::Error::from)?;
    Ok(())
}

/// Delete the item identified by `keys`; deleting a missing item succeeds.
pub async fn delete_item<P, S>(table_name: &str, keys: key::Keys<P, S>) -> Result<()>
where
    P: Serialize,
    S: Serialize,
{
    let client = session::get().await.dynamodb();
    write::delete_item::DeleteItem::new(table_name, keys)
        .send(&client)
        .await
        .map_err(aws_sdk_dynamodb::Error::from)?;
    Ok(())
}

/// Every item matching `key_condition`, across all pages.
///
/// No match yields an empty vector.
pub async fn query<T, P, S>(
    table_name: &str,
    key_condition: key_condition::KeyCondition<P, S>,
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: Serialize,
    S: Serialize,
{
    let items = query_items(table_name, key_condition).await?;
    Ok(serde_dynamo::from_items(items)?)
}

/// The items identified by `keys`, in no particular order.
///
/// Keys without an item are skipped. Keys DynamoDB did not process are handed back
/// untouched in [`read::batch_get_item::BatchGetItemOutput::unprocessed_keys`].
pub async fn batch_get_item<T, P, S>(
    table_name: &str,
    keys: Vec<key::Keys<P, S>>,
) -> Result<read::batch_get_item::BatchGetItemOutput<T>>
where
    T: DeserializeOwned,
    P: Serialize,
    S: Serialize,
{
    let client = session::get().await.dynamodb();
    let output = read::batch_get_item::BatchGetItem::new(table_name, keys)
        .send(&client)
        .await
        .map_err(aws_sdk_dynamodb::Error::from)?;
    Ok(read::batch_get_item::BatchGetItemOutput {
        items: serde_dynamo::from_items(output.items)?,
        unprocessed_keys: output.unprocessed_keys,
    })
}

async fn query_items<P, S>(
    table_name: &str,
    key_condition: key_condition::KeyCondition<P, S>,
) -> Result<Vec<expression::AttributeValues>>
where
    P: Serialize,
    S: Serialize,
{
    let client = session::get().await.dynamodb();
    let output = read::query::Query::new(table_name, key_condition)
        .send(&client)
        .await
        .map_err(aws_sdk_dynamodb::Error::from)?;
    Ok(output.items.unwrap_or_default())
}

fn found_item<T: DeserializeOwned>(item: Option<expression::AttributeValues>) -> Result<T> {
    let item = item
        .filter(|item| !item.is_empty())
        .ok_or(Error::ItemNotFound)?;
    Ok(serde_dynamo::from_item(item)?)
}

fn single_item<T: DeserializeOwned>(mut items: Vec<expression::AttributeValues>) -> Result<T> {
    match items.len() {
        0 => Err(Error::ItemNotFound),
        1 => Ok(serde_dynamo::from_item(items.swap_remove(0))?),
        _ => Err(Error::MultipleItemsFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types::AttributeValue;
    use rstest::rstest;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
    }

    fn row(id: u32) -> expression::AttributeValues {
        HashMap::from([("id".to_string(), AttributeValue::N(id.to_string()))])
    }

    #[rstest]
    #[case::missing(None)]
    #[case::empty(Some(HashMap::new()))]
    fn test_found_item_not_found(#[case] item: Option<expression::AttributeValues>) {
        assert!(matches!(found_item::<Row>(item), Err(Error::ItemNotFound)));
    }

    #[test]
    fn test_found_item() {
        assert_eq!(found_item::<Row>(Some(row(7))).unwrap(), Row { id: 7 });
    }

    #[test]
    fn test_single_item() {
        assert_eq!(single_item::<Row>(vec![row(3)]).unwrap(), Row { id: 3 });
    }

    #[test]
    fn test_single_item_none() {
        assert!(matches!(single_item::<Row>(vec![]), Err(Error::ItemNotFound)));
    }

    #[rstest]
    #[case::two(vec![row(1), row(2)])]
    #[case::three(vec![row(1), row(2), row(3)])]
    fn test_single_item_multiple(#[case] items: Vec<expression::AttributeValues>) {
        assert!(matches!(
            single_item::<Row>(items),
            Err(Error::MultipleItemsFound)
        ));
    }

    #[tokio::test]
    async fn test_update_item_without_fields() {
        let result = update_item(
            "cities",
            key::Keys::partition("State", "NJ"),
            Vec::<(String, u32)>::new(),
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::InvalidArgument(message)) if message == "update fields cannot be empty"
        ));
    }
}
