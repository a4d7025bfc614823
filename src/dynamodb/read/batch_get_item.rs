use crate::dynamodb::key;

use aws_sdk_dynamodb::{Client, error, operation, types};
use serde::Serialize;
use serde_dynamo::{Error, Result};
use std::collections;

/// Maximum number of keys accepted by a single BatchGetItem request.
pub const MAX_KEYS_PER_REQUEST: usize = 100;

type Item = collections::HashMap<String, types::AttributeValue>;

/// Result of a [`BatchGetItem`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetItemOutput<T = Item> {
    /// Items found, in no particular order.
    pub items: Vec<T>,
    /// Keys DynamoDB left unprocessed, to be requested again by the caller.
    pub unprocessed_keys: Vec<Item>,
}

impl BatchGetItemOutput {
    fn extend(
        &mut self,
        table_name: &str,
        output: operation::batch_get_item::BatchGetItemOutput,
    ) {
        if let Some(found) = output
            .responses
            .and_then(|mut responses| responses.remove(table_name))
        {
            self.items.extend(found);
        }
        if let Some(unprocessed) = output
            .unprocessed_keys
            .and_then(|mut unprocessed| unprocessed.remove(table_name))
        {
            self.unprocessed_keys.extend(unprocessed.keys);
        }
    }
}

/// batch get item operation
#[derive(Clone, Debug, Default, PartialEq)]
struct BatchGetItemInput {
    chunks: Vec<Vec<Item>>,
    consistent_read: Option<bool>,
    table_name: String,
}

/// Batch get item operation over a single table.
///
/// Keys are sent in requests of at most [`MAX_KEYS_PER_REQUEST`], one request per chunk.
/// Keys reported back as unprocessed are returned in
/// [`BatchGetItemOutput::unprocessed_keys`] and never resubmitted.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use aws_utils::dynamodb::{key, read};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let batch_get = read::batch_get_item::BatchGetItem::new(
///     "users",
///     vec![key::Keys::partition("id", "1"), key::Keys::partition("id", "2")],
/// );
/// let output = batch_get.send(client).await?;
/// if !output.unprocessed_keys.is_empty() {
///     // throttled: request them again later
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetItem<P, S = P> {
    /// Whether to use strongly consistent reads.
    pub consistent_read: Option<bool>,
    /// Primary keys of the items to retrieve.
    pub keys: Vec<key::Keys<P, S>>,
    /// The name of the table to read from.
    pub table_name: String,
}

impl<P, S> BatchGetItem<P, S> {
    /// Get the items identified by `keys` from `table_name`.
    pub fn new(table_name: impl Into<String>, keys: Vec<key::Keys<P, S>>) -> Self {
        Self {
            consistent_read: None,
            keys,
            table_name: table_name.into(),
        }
    }
}

impl<P: Serialize, S: Serialize> TryFrom<BatchGetItem<P, S>> for BatchGetItemInput {
    type Error = Error;

    fn try_from(batch_get_item: BatchGetItem<P, S>) -> Result<Self> {
        let mut chunks = Vec::with_capacity(batch_get_item.keys.len().div_ceil(MAX_KEYS_PER_REQUEST));
        let mut chunk = Vec::with_capacity(MAX_KEYS_PER_REQUEST.min(batch_get_item.keys.len()));
        for keys in batch_get_item.keys {
            chunk.push(keys.try_into()?);
            if chunk.len() == MAX_KEYS_PER_REQUEST {
                chunks.push(std::mem::take(&mut chunk));
            }
        }
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        let operation = Self {
            chunks,
            consistent_read: batch_get_item.consistent_read,
            table_name: batch_get_item.table_name,
        };
        Ok(operation)
    }
}

impl<P: Serialize, S: Serialize> BatchGetItem<P, S> {
    /// Execute the batch get item operation.
    ///
    /// Keys without an item are skipped.
    #[tracing::instrument(
        name = "aws_utils.dynamodb.batch_get_item",
        skip_all,
        fields(table = %self.table_name, keys = self.keys.len()),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<BatchGetItemOutput, error::SdkError<operation::batch_get_item::BatchGetItemError>>
    {
        let batch_get_item: BatchGetItemInput =
            self.try_into().map_err(error::BuildError::other)?;
        let table_name = batch_get_item.table_name;
        let mut output: BatchGetItemOutput = BatchGetItemOutput::default();
        for chunk in batch_get_item.chunks {
            let request = types::KeysAndAttributes::builder()
                .set_consistent_read(batch_get_item.consistent_read)
                .set_keys(Some(chunk))
                .build()?;
            let response = client
                .batch_get_item()
                .request_items(table_name.clone(), request)
                .send()
                .await?;
            output.extend(&table_name, response);
        }
        if !output.unprocessed_keys.is_empty() {
            tracing::warn!(
                unprocessed = output.unprocessed_keys.len(),
                "batch get left keys unprocessed"
            );
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::Value;

    fn keys(count: usize) -> Vec<key::Keys<Value>> {
        (0..count)
            .map(|id| key::Keys::partition("id", Value::Number(id.into())))
            .collect()
    }

    #[test]
    fn test_batch_get_item_single_chunk() {
        let batch_get_item = BatchGetItem {
            consistent_read: Some(true),
            ..BatchGetItem::new(
                "a",
                vec![key::Keys::composite(
                    "b",
                    Value::String("c".to_string()),
                    "d",
                    Value::Number(1.into()),
                )],
            )
        };
        let actual: BatchGetItemInput = batch_get_item.try_into().unwrap();
        let expected = BatchGetItemInput {
            chunks: vec![vec![collections::HashMap::from([
                ("b".to_string(), types::AttributeValue::S("c".to_string())),
                ("d".to_string(), types::AttributeValue::N("1".to_string())),
            ])]],
            consistent_read: Some(true),
            table_name: "a".to_string(),
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_batch_get_item_chunks_at_request_limit() {
        let actual: BatchGetItemInput = BatchGetItem::new("a", keys(250)).try_into().unwrap();
        let sizes: Vec<_> = actual.chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(
            actual.chunks[2][49],
            collections::HashMap::from([(
                "id".to_string(),
                types::AttributeValue::N("249".to_string())
            )])
        );
    }

    #[test]
    fn test_batch_get_item_exact_multiple() {
        let actual: BatchGetItemInput = BatchGetItem::new("a", keys(200)).try_into().unwrap();
        assert_eq!(actual.chunks.len(), 2);
    }

    #[test]
    fn test_batch_get_item_no_keys() {
        let actual: BatchGetItemInput = BatchGetItem::new("a", keys(0)).try_into().unwrap();
        assert!(actual.chunks.is_empty());
    }

    fn id(value: &str) -> Item {
        collections::HashMap::from([(
            "id".to_string(),
            types::AttributeValue::N(value.to_string()),
        )])
    }

    #[test]
    fn test_output_collects_items_and_unprocessed_keys() {
        let mut output: BatchGetItemOutput = BatchGetItemOutput::default();
        output.extend(
            "a",
            operation::batch_get_item::BatchGetItemOutput::builder()
                .responses("a", vec![id("1"), id("2")])
                .unprocessed_keys(
                    "a",
                    types::KeysAndAttributes::builder()
                        .keys(id("3"))
                        .build()
                        .unwrap(),
                )
                .build(),
        );
        output.extend(
            "a",
            operation::batch_get_item::BatchGetItemOutput::builder()
                .responses("a", vec![id("4")])
                .build(),
        );
        let expected = BatchGetItemOutput {
            items: vec![id("1"), id("2"), id("4")],
            unprocessed_keys: vec![id("3")],
        };
        assert_eq!(output, expected);
    }

    #[test]
    fn test_output_ignores_other_tables() {
        let mut output: BatchGetItemOutput = BatchGetItemOutput::default();
        output.extend(
            "a",
            operation::batch_get_item::BatchGetItemOutput::builder()
                .responses("b", vec![id("1")])
                .build(),
        );
        assert_eq!(output, BatchGetItemOutput::default());
    }
}
