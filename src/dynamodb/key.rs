use aws_sdk_dynamodb::types;
use serde::Serialize;
use serde_dynamo::{Error, Result, to_attribute_value};
use std::collections;

/// Key component: an attribute name and its value.
///
/// ```rust
/// use aws_utils::dynamodb::key;
///
/// let key = key::Key::new("id", "1");
/// assert_eq!(key.name, "id");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Key<T> {
    /// The attribute name of the key.
    pub name: String,
    /// The value of the key.
    pub value: T,
}

impl<T> Key<T> {
    /// Build a key component.
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Primary key of an item: partition key and optional sort key.
///
/// Partition and sort values may have different types.
///
/// ```rust
/// use aws_utils::dynamodb::key;
///
/// let by_id = key::Keys::partition("id", "1");
/// let by_state = key::Keys::composite("State", "NJ", "Id", 1);
/// assert!(by_id.sort_key.is_none());
/// assert_eq!(by_state.sort_key.map(|key| key.value), Some(1));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Keys<P, S = P> {
    /// The partition key (required).
    pub partition_key: Key<P>,
    /// The sort key, for tables with a composite primary key.
    pub sort_key: Option<Key<S>>,
}

impl<P> Keys<P> {
    /// Primary key made of a partition key only.
    pub fn partition(name: impl Into<String>, value: P) -> Self {
        Self {
            partition_key: Key::new(name, value),
            sort_key: None,
        }
    }
}

impl<P, S> Keys<P, S> {
    /// Composite primary key.
    pub fn composite(
        partition_name: impl Into<String>,
        partition_value: P,
        sort_name: impl Into<String>,
        sort_value: S,
    ) -> Self {
        Self {
            partition_key: Key::new(partition_name, partition_value),
            sort_key: Some(Key::new(sort_name, sort_value)),
        }
    }
}

impl<P: Serialize, S: Serialize> TryFrom<Keys<P, S>>
    for collections::HashMap<String, types::AttributeValue>
{
    type Error = Error;

    fn try_from(keys: Keys<P, S>) -> Result<Self> {
        let partition_key_value = to_attribute_value(keys.partition_key.value)?;
        let mut map = Self::from([(keys.partition_key.name, partition_key_value)]);
        if let Some(sort_key) = keys.sort_key {
            let sort_key_value = to_attribute_value(sort_key.value)?;
            map.insert(sort_key.name, sort_key_value);
        }
        Ok(map)
    }
}
