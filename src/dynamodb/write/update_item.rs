use crate::dynamodb::{condition, expression, key, update, write};

use aws_sdk_dynamodb::{Client, error, operation, types};
use serde::Serialize;
use serde_dynamo::{Error, Result};

/// update item operation
#[derive(Debug, PartialEq)]
struct UpdateItemInput {
    keys: expression::AttributeValues,
    return_values: Option<types::ReturnValue>,
    update_expression: Option<String>,
    write_operation: write::common::WriteInput,
}

/// Update item operation.
///
/// Update placeholders (`#upd{n}`) and condition placeholders (`#cond{n}`) never collide,
/// so both expressions share the request-level attribute maps.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use aws_utils::dynamodb::{condition, key, update, write};
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let update_item = write::update_item::UpdateItem::new(
///     "cities",
///     key::Keys::composite("State", "NJ", "Id", 1),
///     update::UpdateExpression::assign([("Population", 360)]),
/// )
/// .with_condition(condition::Condition::Exists("State".to_string()));
/// update_item.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, PartialEq)]
pub struct UpdateItem<P, S, V> {
    /// Condition the existing item must satisfy for the update to succeed.
    pub condition: Option<condition::Condition<V>>,
    /// The primary key of the item to update.
    pub keys: key::Keys<P, S>,
    /// Attributes to return in the output.
    pub return_values: Option<types::ReturnValue>,
    /// The name of the table to write to.
    pub table_name: String,
    /// Actions applied to the item.
    pub update: update::UpdateExpression<V>,
}

impl<P, S, V> UpdateItem<P, S, V> {
    /// Apply `update` to the item identified by `keys`.
    pub fn new(
        table_name: impl Into<String>,
        keys: key::Keys<P, S>,
        update: update::UpdateExpression<V>,
    ) -> Self {
        Self {
            condition: None,
            keys,
            return_values: None,
            table_name: table_name.into(),
            update,
        }
    }

    /// Only update when `condition` holds.
    pub fn with_condition(mut self, condition: condition::Condition<V>) -> Self {
        self.condition = Some(condition);
        self
    }
}

impl<P: Serialize, S: Serialize, V: Serialize> TryFrom<UpdateItem<P, S, V>> for UpdateItemInput {
    type Error = Error;

    fn try_from(update_item: UpdateItem<P, S, V>) -> Result<Self> {
        let mut write_operation =
            write::common::WriteInput::new(update_item.table_name, update_item.condition)?;
        let update_expression = if update_item.update.is_empty() {
            None
        } else {
            let update_operation: expression::ExpressionInput = update_item.update.try_into()?;
            Some(write_operation.merge_expression(update_operation))
        };
        let operation = Self {
            keys: update_item.keys.try_into()?,
            return_values: update_item.return_values,
            update_expression,
            write_operation,
        };
        Ok(operation)
    }
}

impl<P: Serialize, S: Serialize, V: Serialize> UpdateItem<P, S, V> {
    /// Execute the update item operation.
    #[tracing::instrument(
        name = "aws_utils.dynamodb.update_item",
        skip_all,
        fields(table = %self.table_name),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::update_item::UpdateItemOutput,
        error::SdkError<operation::update_item::UpdateItemError>,
    > {
        let update_item: UpdateItemInput = self.try_into().map_err(error::BuildError::other)?;
        let builder = client
            .update_item()
            .set_key(Some(update_item.keys))
            .set_return_values(update_item.return_values)
            .set_update_expression(update_item.update_expression);
        write::common::apply_write_input!(builder, update_item.write_operation)
            .send()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use serde_json::{Value, json};
    use std::collections;

    #[rstest]
    #[case::assign(
        UpdateItem::new(
            "a",
            key::Keys::partition("b", json!("c")),
            update::UpdateExpression::assign([("d", json!(1))]),
        ),
        UpdateItemInput {
            keys: collections::HashMap::from(
                [
                    ("b".to_string(), types::AttributeValue::S("c".to_string())),
                ]
            ),
            return_values: None,
            update_expression: Some("SET #upd0 = :upd0".to_string()),
            write_operation: write::common::WriteInput {
                expression_attribute_names: Some(
                    collections::HashMap::from(
                        [
                            ("#upd0".to_string(), "d".to_string()),
                        ]
                    )
                ),
                expression_attribute_values: Some(
                    collections::HashMap::from(
                        [
                            (":upd0".to_string(), types::AttributeValue::N("1".to_string())),
                        ]
                    )
                ),
                table_name: "a".to_string(),
                ..Default::default()
            },
        }
    )]
    #[case::conditional(
        UpdateItem {
            return_values: Some(types::ReturnValue::AllNew),
            ..UpdateItem::new(
                "a",
                key::Keys::composite("b", json!("c"), "d", json!(2)),
                update::UpdateExpression::assign([("e", json!("f"))]).remove("g"),
            )
            .with_condition(condition::Condition::Exists("b".to_string()))
        },
        UpdateItemInput {
            keys: collections::HashMap::from(
                [
                    ("b".to_string(), types::AttributeValue::S("c".to_string())),
                    ("d".to_string(), types::AttributeValue::N("2".to_string())),
                ]
            ),
            return_values: Some(types::ReturnValue::AllNew),
            update_expression: Some("SET #upd0 = :upd0 REMOVE #upd1".to_string()),
            write_operation: write::common::WriteInput {
                condition_expression: Some("attribute_exists(#cond0)".to_string()),
                expression_attribute_names: Some(
                    collections::HashMap::from(
                        [
                            ("#cond0".to_string(), "b".to_string()),
                            ("#upd0".to_string(), "e".to_string()),
                            ("#upd1".to_string(), "g".to_string()),
                        ]
                    )
                ),
                expression_attribute_values: Some(
                    collections::HashMap::from(
                        [
                            (":upd0".to_string(), types::AttributeValue::S("f".to_string())),
                        ]
                    )
                ),
                table_name: "a".to_string(),
            },
        }
    )]
    #[case::empty_update(
        UpdateItem::new(
            "a",
            key::Keys::partition("b", json!("c")),
            update::UpdateExpression::default(),
        ),
        UpdateItemInput {
            keys: collections::HashMap::from(
                [
                    ("b".to_string(), types::AttributeValue::S("c".to_string())),
                ]
            ),
            return_values: None,
            update_expression: None,
            write_operation: write::common::WriteInput {
                table_name: "a".to_string(),
                ..Default::default()
            },
        }
    )]
    fn test_update_item(
        #[case] args: UpdateItem<Value, Value, Value>,
        #[case] expected: UpdateItemInput,
    ) {
        let actual: UpdateItemInput = args.try_into().unwrap();
        assert_eq!(actual, expected);
    }
}
