use crate::dynamodb::{expression, key_condition};

use aws_sdk_dynamodb::{Client, error, operation};
use serde::Serialize;
use serde_dynamo::{Error, Result};

/// query operation
#[derive(Clone, Debug, Default, PartialEq)]
struct QueryInput {
    consistent_read: Option<bool>,
    expression_attribute_names: Option<expression::AttributeNames>,
    expression_attribute_values: Option<expression::AttributeValues>,
    index_name: Option<String>,
    key_condition_expression: String,
    scan_index_forward: Option<bool>,
    table_name: String,
}

/// Query operation.
///
/// Every page is fetched; the returned output holds all matching items.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use aws_utils::dynamodb::{key_condition, read};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let condition = key_condition::KeyCondition::partition("State", "NJ")
///     .with_sort_key("Id", key_condition::Comparison::GreaterThan(10));
/// let output = read::query::Query::new("cities", condition).send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Query<P, S = P> {
    /// Whether to use a strongly consistent read.
    pub consistent_read: Option<bool>,
    /// Partition key, optional sort key condition and optional index.
    pub key_condition: key_condition::KeyCondition<P, S>,
    /// Ascending (`true`, default) or descending sort key order.
    pub scan_index_forward: Option<bool>,
    /// The name of the table to query.
    pub table_name: String,
}

impl<P, S> Query<P, S> {
    /// Query `table_name` with `key_condition`.
    pub fn new(
        table_name: impl Into<String>,
        key_condition: key_condition::KeyCondition<P, S>,
    ) -> Self {
        Self {
            consistent_read: None,
            key_condition,
            scan_index_forward: None,
            table_name: table_name.into(),
        }
    }
}

impl<P: Serialize, S: Serialize> TryFrom<Query<P, S>> for QueryInput {
    type Error = Error;

    fn try_from(query: Query<P, S>) -> Result<Self> {
        let key_condition::KeyCondition {
            index_name,
            partition_key,
            sort_key,
        } = query.key_condition;
        let key_condition_operation =
            key_condition::KeyCondition::get_expression_input(partition_key, sort_key)?;
        let mut operation = Self {
            consistent_read: query.consistent_read,
            index_name,
            scan_index_forward: query.scan_index_forward,
            table_name: query.table_name,
            ..Default::default()
        };
        operation.key_condition_expression = key_condition_operation.merge_into(
            &mut operation.expression_attribute_names,
            &mut operation.expression_attribute_values,
        );
        Ok(operation)
    }
}

impl<P: Serialize, S: Serialize> Query<P, S> {
    /// Execute the query operation.
    #[tracing::instrument(
        name = "aws_utils.dynamodb.query",
        skip_all,
        fields(table = %self.table_name, index = ?self.key_condition.index_name),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<operation::query::QueryOutput, error::SdkError<operation::query::QueryError>> {
        let query: QueryInput = self.try_into().map_err(error::BuildError::other)?;
        let mut paginator = client
            .query()
            .set_consistent_read(query.consistent_read)
            .set_expression_attribute_names(query.expression_attribute_names)
            .set_expression_attribute_values(query.expression_attribute_values)
            .set_index_name(query.index_name)
            .key_condition_expression(query.key_condition_expression)
            .set_scan_index_forward(query.scan_index_forward)
            .table_name(query.table_name)
            .into_paginator()
            .send();
        let mut items = Vec::new();
        let mut count = 0;
        let mut scanned_count = 0;
        while let Some(page) = paginator.next().await {
            let page = page?;
            count += page.count;
            scanned_count += page.scanned_count;
            if let Some(page_items) = page.items {
                items.extend(page_items);
            }
        }
        tracing::debug!(count, scanned_count, "query completed");
        let output = operation::query::QueryOutput::builder()
            .set_items(Some(items))
            .count(count)
            .scanned_count(scanned_count)
            .build();
        Ok(output)
    }
}
