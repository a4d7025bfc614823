use crate::dynamodb::expression;

use indexmap::IndexMap;
use serde::Serialize;
use serde_dynamo::{Error, Result, to_attribute_value};
use std::collections;

/// Action applied to an attribute in the SET clause.
#[derive(Clone, Debug, PartialEq)]
pub enum SetAction<T> {
    /// Replace the attribute value.
    Assign(T),
    /// Add to a numeric attribute.
    Increment(T),
    /// Assign only when the attribute does not exist yet.
    IfNotExists(T),
    /// Append to a list attribute.
    ListAppend(T),
}

impl<T> SetAction<T> {
    fn into_parts(self, path: &str, value: &str) -> (T, String) {
        match self {
            Self::Assign(operand) => (operand, format!("{path} = {value}")),
            Self::Increment(operand) => (operand, format!("{path} = {path} + {value}")),
            Self::IfNotExists(operand) => {
                (operand, format!("{path} = if_not_exists({path}, {value})"))
            }
            Self::ListAppend(operand) => {
                (operand, format!("{path} = list_append({path}, {value})"))
            }
        }
    }
}

/// Update expression: SET actions in insertion order, then REMOVE.
///
/// ```rust
/// use aws_utils::dynamodb::update::{SetAction, UpdateExpression};
///
/// let update = UpdateExpression::assign([("Population", 360)])
///     .set("Visits", SetAction::Increment(1))
///     .remove("Mayor");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateExpression<T> {
    /// SET actions by attribute name.
    pub set: IndexMap<String, SetAction<T>>,
    /// Attributes to REMOVE.
    pub remove: Vec<String>,
}

impl<T> Default for UpdateExpression<T> {
    fn default() -> Self {
        Self {
            set: IndexMap::new(),
            remove: Vec::new(),
        }
    }
}

impl<T> UpdateExpression<T> {
    /// Assign every field to its value.
    pub fn assign<K: Into<String>>(fields: impl IntoIterator<Item = (K, T)>) -> Self {
        let set = fields
            .into_iter()
            .map(|(name, value)| (name.into(), SetAction::Assign(value)))
            .collect();
        Self {
            set,
            remove: Vec::new(),
        }
    }

    /// Add a SET action, replacing any previous action on the same attribute.
    pub fn set(mut self, name: impl Into<String>, action: SetAction<T>) -> Self {
        self.set.insert(name.into(), action);
        self
    }

    /// Add an attribute to REMOVE.
    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.remove.push(name.into());
        self
    }

    /// Whether the expression has no action at all.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }
}

impl<T: Serialize> TryFrom<UpdateExpression<T>> for expression::ExpressionInput {
    type Error = Error;

    fn try_from(update: UpdateExpression<T>) -> Result<Self> {
        let mut index = 0;
        let mut set_operations = Vec::with_capacity(update.set.len());
        for (name, action) in update.set {
            let path = format!("#upd{index}");
            let value_placeholder = format!(":upd{index}");
            index += 1;
            let (operand, expression) = action.into_parts(&path, &value_placeholder);
            let operand = to_attribute_value(operand)?;
            set_operations.push(expression::ExpressionInput {
                expression,
                expression_attribute_names: collections::HashMap::from([(path, name)]),
                expression_attribute_values: collections::HashMap::from([(
                    value_placeholder,
                    operand,
                )]),
            });
        }
        let mut remove_operations = Vec::with_capacity(update.remove.len());
        for name in update.remove {
            let path = format!("#upd{index}");
            index += 1;
            remove_operations.push(expression::ExpressionInput {
                expression: path.clone(),
                expression_attribute_names: collections::HashMap::from([(path, name)]),
                ..Default::default()
            });
        }
        let mut clauses = Vec::with_capacity(2);
        if !set_operations.is_empty() {
            let mut set = expression::ExpressionInput::join(", ", set_operations);
            set.expression = format!("SET {}", set.expression);
            clauses.push(set);
        }
        if !remove_operations.is_empty() {
            let mut remove = expression::ExpressionInput::join(", ", remove_operations);
            remove.expression = format!("REMOVE {}", remove.expression);
            clauses.push(remove);
        }
        Ok(expression::ExpressionInput::join(" ", clauses))
    }
}
