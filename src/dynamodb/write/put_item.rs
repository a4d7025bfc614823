use crate::dynamodb::{condition, expression, write};

use aws_sdk_dynamodb::{Client, error, operation};
use serde::Serialize;
use serde_dynamo::{Error, Result, to_item};

/// put item operation
#[derive(Debug, PartialEq)]
struct PutItemInput {
    item: expression::AttributeValues,
    write_operation: write::common::WriteInput,
}

/// Put item operation: creates an item or replaces it entirely.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use aws_utils::dynamodb::{condition, write};
/// use serde_json::json;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let put_item = write::put_item::PutItem::new("users", json!({"id": "1", "name": "John"}))
///     .with_condition(condition::Condition::<bool>::NotExists("id".to_string()));
/// put_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq)]
pub struct PutItem<T, C = T> {
    /// Condition the existing item must satisfy for the put to succeed.
    pub condition: Option<condition::Condition<C>>,
    /// The item to put into the table; must serialize to a map.
    pub item: T,
    /// The name of the table to write to.
    pub table_name: String,
}

impl<T> PutItem<T> {
    /// Put `item` into `table_name` unconditionally.
    pub fn new(table_name: impl Into<String>, item: T) -> Self {
        Self {
            condition: None,
            item,
            table_name: table_name.into(),
        }
    }
}

impl<T, C> PutItem<T, C> {
    /// Only write when `condition` holds.
    pub fn with_condition<D>(self, condition: condition::Condition<D>) -> PutItem<T, D> {
        PutItem {
            condition: Some(condition),
            item: self.item,
            table_name: self.table_name,
        }
    }
}

impl<T: Serialize, C: Serialize> TryFrom<PutItem<T, C>> for PutItemInput {
    type Error = Error;

    fn try_from(put_item: PutItem<T, C>) -> Result<Self> {
        let operation = Self {
            item: to_item(put_item.item)?,
            write_operation: write::common::WriteInput::new(
                put_item.table_name,
                put_item.condition,
            )?,
        };
        Ok(operation)
    }
}

impl<T: Serialize, C: Serialize> PutItem<T, C> {
    /// Execute the put item operation.
    #[tracing::instrument(
        name = "aws_utils.dynamodb.put_item",
        skip_all,
        fields(table = %self.table_name),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::put_item::PutItemOutput,
        error::SdkError<operation::put_item::PutItemError>,
    > {
        let put_item: PutItemInput = self.try_into().map_err(error::BuildError::other)?;
        let builder = client.put_item().set_item(Some(put_item.item));
        write::common::apply_write_input!(builder, put_item.write_operation)
            .send()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use serde_json::{Value, json};
    use std::collections;

    #[rstest]
    #[case::unconditional(
        PutItem::new(
            "c",
            json!(
                {
                    "a": "b"
                }
            ),
        ),
        PutItemInput {
            item: collections::HashMap::from(
                [(
                    "a".to_string(),
                    types::AttributeValue::S(
                        "b".to_string()
                    ),
                )]
            ),
            write_operation: write::common::WriteInput {
                table_name: "c".to_string(),
                ..Default::default()
            },
        }
    )]
    #[case::with_expression(
        PutItem::new(
            "c",
            json!(
                {
                    "a": "b",
                    "deleted": false
                }
            ),
        )
        .with_condition(
            condition::Condition::expression(
                "deleted = :deleted",
                [(":deleted", Value::Bool(false))],
            )
        ),
        PutItemInput {
            item: collections::HashMap::from(
                [
                    (
                        "a".to_string(),
                        types::AttributeValue::S(
                            "b".to_string()
                        ),
                    ),
                    (
                        "deleted".to_string(),
                        types::AttributeValue::Bool(false),
                    ),
                ]
            ),
            write_operation: write::common::WriteInput {
                condition_expression: Some(
                    "deleted = :deleted".to_string()
                ),
                expression_attribute_values: Some(
                    collections::HashMap::from(
                        [
                            (
                                ":deleted".to_string(),
                                types::AttributeValue::Bool(false)
                            ),
                        ]
                    )
                ),
                table_name: "c".to_string(),
                ..Default::default()
            },
        }
    )]
    fn test_put_item(#[case] args: PutItem<Value>, #[case] expected: PutItemInput) {
        let actual: PutItemInput = args.try_into().unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_put_item_rejects_non_map_item() {
        let put_item = PutItem::new("a", json!("not a map"));
        let actual: Result<PutItemInput> = put_item.try_into();
        assert!(actual.is_err());
    }
}
