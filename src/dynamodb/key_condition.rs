//! Key-condition expressions for Query.
//!
//! A [`KeyCondition`] selects items by partition key equality and, optionally, one
//! comparison on the sort key. It renders with fixed placeholders, so attribute names
//! never have to be valid placeholder identifiers:
//!
//! | sort key condition | expression |
//! |---|---|
//! | none | `#pkname = :pkval` |
//! | `Equal` | `#pkname = :pkval AND #skname = :skval` |
//! | `LessThan` | `#pkname = :pkval AND #skname < :skval` |
//! | `LessThanOrEqual` | `#pkname = :pkval AND #skname <= :skval` |
//! | `GreaterThan` | `#pkname = :pkval AND #skname > :skval` |
//! | `GreaterThanOrEqual` | `#pkname = :pkval AND #skname >= :skval` |
//! | `Between` | `#pkname = :pkval AND #skname BETWEEN :skval1 AND :skval2` |

use crate::dynamodb::{expression, key};

use serde::Serialize;
use serde_dynamo::{Result, to_attribute_value};
use std::collections;

const PARTITION_KEY_NAME: &str = "#pkname";
const PARTITION_KEY_VALUE: &str = ":pkval";
const SORT_KEY_NAME: &str = "#skname";
const SORT_KEY_VALUE: &str = ":skval";
const SORT_KEY_START: &str = ":skval1";
const SORT_KEY_END: &str = ":skval2";

/// Comparison applied to a single attribute.
///
/// ```rust
/// use aws_utils::dynamodb::key_condition::Comparison;
///
/// let after = Comparison::GreaterThan("2020-01-01");
/// let range = Comparison::Between(1, 10);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Comparison<T> {
    /// Attribute equals the value.
    Equal(T),
    /// Attribute is less than the value.
    LessThan(T),
    /// Attribute is less than or equal to the value.
    LessThanOrEqual(T),
    /// Attribute is greater than the value.
    GreaterThan(T),
    /// Attribute is greater than or equal to the value.
    GreaterThanOrEqual(T),
    /// Attribute lies between the two values, both included.
    Between(T, T),
}

impl<T: Serialize> Comparison<T> {
    /// Render the comparison against the `name` placeholder.
    ///
    /// Single-value comparisons use `value`; `Between` uses `start` and `end`.
    pub(crate) fn render(
        self,
        name: &str,
        value: &str,
        start: &str,
        end: &str,
    ) -> Result<(String, expression::AttributeValues)> {
        let operator = match &self {
            Self::Equal(_) => "=",
            Self::LessThan(_) => "<",
            Self::LessThanOrEqual(_) => "<=",
            Self::GreaterThan(_) => ">",
            Self::GreaterThanOrEqual(_) => ">=",
            Self::Between(..) => "BETWEEN",
        };
        match self {
            Self::Between(low, high) => {
                let low = to_attribute_value(low)?;
                let high = to_attribute_value(high)?;
                let rendered = format!("{name} {operator} {start} AND {end}");
                let values =
                    collections::HashMap::from([(start.to_string(), low), (end.to_string(), high)]);
                Ok((rendered, values))
            }
            Self::Equal(operand)
            | Self::LessThan(operand)
            | Self::LessThanOrEqual(operand)
            | Self::GreaterThan(operand)
            | Self::GreaterThanOrEqual(operand) => {
                let operand = to_attribute_value(operand)?;
                let rendered = format!("{name} {operator} {value}");
                let values = collections::HashMap::from([(value.to_string(), operand)]);
                Ok((rendered, values))
            }
        }
    }
}

/// Condition on the sort key of a query.
#[derive(Clone, Debug, PartialEq)]
pub struct SortKeyCondition<S> {
    /// Attribute name of the sort key.
    pub name: String,
    /// Comparison the sort key must satisfy.
    pub comparison: Comparison<S>,
}

/// Parameters of a query with a key-condition expression.
///
/// ```rust
/// use aws_utils::dynamodb::key_condition::{Comparison, KeyCondition};
///
/// let condition = KeyCondition::partition("State", "NJ")
///     .with_sort_key("Id", Comparison::Between(1, 100))
///     .with_index_name("by-state");
/// assert_eq!(condition.index_name.as_deref(), Some("by-state"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct KeyCondition<P, S = P> {
    /// Secondary index to query instead of the base table.
    pub index_name: Option<String>,
    /// Partition key, matched by equality.
    pub partition_key: key::Key<P>,
    /// Optional condition on the sort key.
    pub sort_key: Option<SortKeyCondition<S>>,
}

impl<P> KeyCondition<P> {
    /// Query every item of a partition.
    pub fn partition(name: impl Into<String>, value: P) -> Self {
        Self {
            index_name: None,
            partition_key: key::Key::new(name, value),
            sort_key: None,
        }
    }
}

impl<P, S> KeyCondition<P, S> {
    /// Restrict the query with a sort key comparison.
    pub fn with_sort_key<T>(
        self,
        name: impl Into<String>,
        comparison: Comparison<T>,
    ) -> KeyCondition<P, T> {
        KeyCondition {
            index_name: self.index_name,
            partition_key: self.partition_key,
            sort_key: Some(SortKeyCondition {
                name: name.into(),
                comparison,
            }),
        }
    }

    /// Run the query against a secondary index.
    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }
}

impl<P: Serialize, S: Serialize> KeyCondition<P, S> {
    pub(crate) fn get_expression_input(
        partition_key: key::Key<P>,
        sort_key: Option<SortKeyCondition<S>>,
    ) -> Result<expression::ExpressionInput> {
        let (partition_expression, partition_values) = Comparison::Equal(partition_key.value)
            .render(
                PARTITION_KEY_NAME,
                PARTITION_KEY_VALUE,
                PARTITION_KEY_VALUE,
                PARTITION_KEY_VALUE,
            )?;
        let mut operations = vec![expression::ExpressionInput {
            expression: partition_expression,
            expression_attribute_names: collections::HashMap::from([(
                PARTITION_KEY_NAME.to_string(),
                partition_key.name,
            )]),
            expression_attribute_values: partition_values,
        }];
        if let Some(sort_key) = sort_key {
            let (sort_expression, sort_values) = sort_key.comparison.render(
                SORT_KEY_NAME,
                SORT_KEY_VALUE,
                SORT_KEY_START,
                SORT_KEY_END,
            )?;
            operations.push(expression::ExpressionInput {
                expression: sort_expression,
                expression_attribute_names: collections::HashMap::from([(
                    SORT_KEY_NAME.to_string(),
                    sort_key.name,
                )]),
                expression_attribute_values: sort_values,
            });
        }
        Ok(expression::ExpressionInput::join(" AND ", operations))
    }
}

/// Exact-match condition on a full primary key.
impl<P, S> From<key::Keys<P, S>> for KeyCondition<P, S> {
    fn from(keys: key::Keys<P, S>) -> Self {
        Self {
            index_name: None,
            partition_key: keys.partition_key,
            sort_key: keys.sort_key.map(|sort_key| SortKeyCondition {
                name: sort_key.name,
                comparison: Comparison::Equal(sort_key.value),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aws_sdk_dynamodb::types;
    use rstest::rstest;
    use serde_json::Value;

    fn number(value: i64) -> Value {
        Value::Number(value.into())
    }

    fn expected(
        expression: &str,
        sort_values: &[(&str, &str)],
    ) -> expression::ExpressionInput {
        let mut expression_attribute_names =
            collections::HashMap::from([("#pkname".to_string(), "State".to_string())]);
        let mut expression_attribute_values = collections::HashMap::from([(
            ":pkval".to_string(),
            types::AttributeValue::S("NJ".to_string()),
        )]);
        if !sort_values.is_empty() {
            expression_attribute_names.insert("#skname".to_string(), "Id".to_string());
        }
        for (placeholder, value) in sort_values {
            expression_attribute_values.insert(
                placeholder.to_string(),
                types::AttributeValue::N(value.to_string()),
            );
        }
        expression::ExpressionInput {
            expression: expression.to_string(),
            expression_attribute_names,
            expression_attribute_values,
        }
    }

    #[rstest]
    #[case::partition_only(None, expected("#pkname = :pkval", &[]))]
    #[case::equal(
        Some(Comparison::Equal(number(1))),
        expected("#pkname = :pkval AND #skname = :skval", &[(":skval", "1")])
    )]
    #[case::less_than(
        Some(Comparison::LessThan(number(2))),
        expected("#pkname = :pkval AND #skname < :skval", &[(":skval", "2")])
    )]
    #[case::less_than_or_equal(
        Some(Comparison::LessThanOrEqual(number(3))),
        expected("#pkname = :pkval AND #skname <= :skval", &[(":skval", "3")])
    )]
    #[case::greater_than(
        Some(Comparison::GreaterThan(number(4))),
        expected("#pkname = :pkval AND #skname > :skval", &[(":skval", "4")])
    )]
    #[case::greater_than_or_equal(
        Some(Comparison::GreaterThanOrEqual(number(5))),
        expected("#pkname = :pkval AND #skname >= :skval", &[(":skval", "5")])
    )]
    #[case::between(
        Some(Comparison::Between(number(6), number(9))),
        expected(
            "#pkname = :pkval AND #skname BETWEEN :skval1 AND :skval2",
            &[(":skval1", "6"), (":skval2", "9")]
        )
    )]
    fn test_key_condition_expression(
        #[case] comparison: Option<Comparison<Value>>,
        #[case] expected: expression::ExpressionInput,
    ) {
        let mut condition = KeyCondition {
            index_name: None,
            partition_key: key::Key::new("State", Value::String("NJ".to_string())),
            sort_key: None,
        };
        if let Some(comparison) = comparison {
            condition = condition.with_sort_key("Id", comparison);
        }
        let actual =
            KeyCondition::get_expression_input(condition.partition_key, condition.sort_key)
                .unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_from_keys_matches_sort_key_exactly() {
        let condition: KeyCondition<&str, i32> = key::Keys::composite("State", "NJ", "Id", 7).into();
        assert_eq!(condition.index_name, None);
        assert_eq!(condition.partition_key, key::Key::new("State", "NJ"));
        assert_eq!(
            condition.sort_key,
            Some(SortKeyCondition {
                name: "Id".to_string(),
                comparison: Comparison::Equal(7),
            })
        );
    }

    #[test]
    fn test_attribute_names_are_not_placeholders() {
        let condition = KeyCondition::partition("user-id", "u1")
            .with_sort_key("created.at", Comparison::GreaterThan("2020"));
        let actual =
            KeyCondition::get_expression_input(condition.partition_key, condition.sort_key)
                .unwrap();
        assert_eq!(actual.expression, "#pkname = :pkval AND #skname > :skval");
        assert_eq!(
            actual.expression_attribute_names,
            collections::HashMap::from([
                ("#pkname".to_string(), "user-id".to_string()),
                ("#skname".to_string(), "created.at".to_string()),
            ])
        );
    }
}
