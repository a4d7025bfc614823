use crate::dynamodb::{expression, key_condition};

use serde::Serialize;
use serde_dynamo::{Error, Result, to_attribute_value};
use std::collections;

/// Condition expression for conditional writes.
///
/// Attribute names and values are replaced by `#cond{n}` / `:cond{n}` placeholders
/// numbered in rendering order. [`Condition::Expression`] is passed through as written.
///
/// ```rust
/// use aws_utils::dynamodb::condition::Condition;
/// use aws_utils::dynamodb::key_condition::Comparison;
///
/// let not_deleted = Condition::All(vec![
///     Condition::Exists("id".to_string()),
///     Condition::Compare {
///         name: "deleted".to_string(),
///         comparison: Comparison::Equal(false),
///     },
/// ]);
/// let raw = Condition::expression("deleted = :deleted", [(":deleted", false)]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Condition<T> {
    /// Compare an attribute with a value.
    Compare {
        /// Attribute name.
        name: String,
        /// Comparison to apply.
        comparison: key_condition::Comparison<T>,
    },
    /// `attribute_exists(name)`.
    Exists(String),
    /// `attribute_not_exists(name)`.
    NotExists(String),
    /// Every condition holds.
    All(Vec<Condition<T>>),
    /// At least one condition holds.
    Any(Vec<Condition<T>>),
    /// Hand-written expression with its own placeholders.
    Expression {
        /// The expression, e.g. `deleted = :deleted`.
        expression: String,
        /// Attribute name placeholders used by the expression.
        names: collections::HashMap<String, String>,
        /// Attribute value placeholders used by the expression.
        values: collections::HashMap<String, T>,
    },
}

impl<T> Condition<T> {
    /// Hand-written expression referencing value placeholders only.
    pub fn expression<K: Into<String>>(
        expression: impl Into<String>,
        values: impl IntoIterator<Item = (K, T)>,
    ) -> Self {
        Self::Expression {
            expression: expression.into(),
            names: collections::HashMap::new(),
            values: values
                .into_iter()
                .map(|(placeholder, value)| (placeholder.into(), value))
                .collect(),
        }
    }
}

impl<T: Serialize> Condition<T> {
    fn is_compound(&self) -> bool {
        matches!(self, Self::All(conditions) | Self::Any(conditions) if conditions.len() > 1)
    }

    fn render(self, index: &mut usize) -> Result<expression::ExpressionInput> {
        let input = match self {
            Self::Compare { name, comparison } => {
                let name_placeholder = format!("#cond{index}");
                let value_placeholder = format!(":cond{index}");
                let (expression, expression_attribute_values) = comparison.render(
                    &name_placeholder,
                    &value_placeholder,
                    &format!("{value_placeholder}_start"),
                    &format!("{value_placeholder}_end"),
                )?;
                *index += 1;
                expression::ExpressionInput {
                    expression,
                    expression_attribute_names: collections::HashMap::from([(
                        name_placeholder,
                        name,
                    )]),
                    expression_attribute_values,
                }
            }
            Self::Exists(name) => Self::function("attribute_exists", name, index),
            Self::NotExists(name) => Self::function("attribute_not_exists", name, index),
            Self::All(conditions) => Self::render_all(" AND ", conditions, index)?,
            Self::Any(conditions) => Self::render_all(" OR ", conditions, index)?,
            Self::Expression {
                expression,
                names,
                values,
            } => {
                let mut expression_attribute_values = collections::HashMap::with_capacity(values.len());
                for (placeholder, value) in values {
                    expression_attribute_values.insert(placeholder, to_attribute_value(value)?);
                }
                expression::ExpressionInput {
                    expression,
                    expression_attribute_names: names,
                    expression_attribute_values,
                }
            }
        };
        Ok(input)
    }

    fn function(function: &str, name: String, index: &mut usize) -> expression::ExpressionInput {
        let name_placeholder = format!("#cond{index}");
        *index += 1;
        expression::ExpressionInput {
            expression: format!("{function}({name_placeholder})"),
            expression_attribute_names: collections::HashMap::from([(name_placeholder, name)]),
            ..Default::default()
        }
    }

    fn render_all(
        separator: &str,
        conditions: Vec<Self>,
        index: &mut usize,
    ) -> Result<expression::ExpressionInput> {
        let mut inputs = Vec::with_capacity(conditions.len());
        for condition in conditions {
            let is_compound = condition.is_compound();
            let mut input = condition.render(index)?;
            if is_compound {
                input.expression = format!("({})", input.expression);
            }
            inputs.push(input);
        }
        Ok(expression::ExpressionInput::join(separator, inputs))
    }
}

impl<T: Serialize> TryFrom<Condition<T>> for expression::ExpressionInput {
    type Error = Error;

    fn try_from(condition: Condition<T>) -> Result<Self> {
        condition.render(&mut 0)
    }
}
