use aws_sdk_dynamodb::types;
use std::collections;

pub(crate) type AttributeNames = collections::HashMap<String, String>;
pub(crate) type AttributeValues = collections::HashMap<String, types::AttributeValue>;

/// A rendered expression together with the placeholders it references.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExpressionInput {
    pub(crate) expression: String,
    pub(crate) expression_attribute_names: AttributeNames,
    pub(crate) expression_attribute_values: AttributeValues,
}

impl ExpressionInput {
    /// Join `items` with `separator`, skipping empty expressions and unioning placeholders.
    pub(crate) fn join(separator: &str, items: Vec<Self>) -> Self {
        let mut joined = Self::default();
        for item in items {
            joined
                .expression_attribute_names
                .extend(item.expression_attribute_names);
            joined
                .expression_attribute_values
                .extend(item.expression_attribute_values);
            if item.expression.is_empty() {
                continue;
            }
            if !joined.expression.is_empty() {
                joined.expression.push_str(separator);
            }
            joined.expression.push_str(&item.expression);
        }
        joined
    }

    /// Move the placeholders into the request-level maps and return the expression.
    pub(crate) fn merge_into(
        self,
        names: &mut Option<AttributeNames>,
        values: &mut Option<AttributeValues>,
    ) -> String {
        if !self.expression_attribute_names.is_empty() {
            names
                .get_or_insert_with(Default::default)
                .extend(self.expression_attribute_names);
        }
        if !self.expression_attribute_values.is_empty() {
            values
                .get_or_insert_with(Default::default)
                .extend(self.expression_attribute_values);
        }
        self.expression
    }
}
