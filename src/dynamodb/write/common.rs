use crate::dynamodb::{condition, expression};

use serde::Serialize;
use serde_dynamo::Result;

/// Resolved parameters shared by put, update and delete requests.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct WriteInput {
    pub(crate) condition_expression: Option<String>,
    pub(crate) expression_attribute_names: Option<expression::AttributeNames>,
    pub(crate) expression_attribute_values: Option<expression::AttributeValues>,
    pub(crate) table_name: String,
}

impl WriteInput {
    pub(crate) fn new<C: Serialize>(
        table_name: String,
        condition: Option<condition::Condition<C>>,
    ) -> Result<Self> {
        let mut operation = Self {
            table_name,
            ..Default::default()
        };
        if let Some(condition) = condition {
            let condition_operation: expression::ExpressionInput = condition.try_into()?;
            operation.condition_expression = Some(operation.merge_expression(condition_operation));
        }
        Ok(operation)
    }

    /// Merge an expression into this write operation and return its text.
    pub(crate) fn merge_expression(&mut self, operation: expression::ExpressionInput) -> String {
        operation.merge_into(
            &mut self.expression_attribute_names,
            &mut self.expression_attribute_values,
        )
    }
}

/// apply common write operation settings to a builder
macro_rules! apply_write_input {
    ($builder:expr, $write_input:expr) => {
        $builder
            .set_condition_expression($write_input.condition_expression)
            .set_expression_attribute_names($write_input.expression_attribute_names)
            .set_expression_attribute_values($write_input.expression_attribute_values)
            .table_name($write_input.table_name)
    };
}

pub(crate) use apply_write_input;
