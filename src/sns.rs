//! SNS helpers: publish JSON messages to a topic.

use crate::{Error, Result, session};

use aws_sdk_sns::{Client, error, operation, types};
use serde::Serialize;
use std::collections;

const STRING_DATA_TYPE: &str = "String";

/// publish operation
#[derive(Clone, Debug, Default, PartialEq)]
struct PublishInput {
    message: String,
    message_attributes: Option<collections::HashMap<String, types::MessageAttributeValue>>,
    topic_arn: String,
}

/// Publish operation.
///
/// Every message attribute is sent with the `String` data type, which is what
/// subscription filter policies match on.
///
/// ```rust,no_run
/// use aws_sdk_sns::Client;
/// use aws_utils::sns;
/// use serde_json::json;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let publish = sns::Publish::json("arn:aws:sns:us-east-1:000000000000:orders", &json!({"id": 1}))?
///     .with_attribute("kind", "created");
/// publish.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Publish {
    /// Message body.
    pub message: String,
    /// Message attributes, used for subscription filtering.
    pub message_attributes: collections::HashMap<String, String>,
    /// Topic to publish to; must not be empty.
    pub topic_arn: String,
}

impl Publish {
    /// Publish `message` serialized as JSON.
    pub fn json<T: Serialize + ?Sized>(
        topic_arn: impl Into<String>,
        message: &T,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            message: serde_json::to_string(message)?,
            message_attributes: collections::HashMap::new(),
            topic_arn: topic_arn.into(),
        })
    }

    /// Add a message attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.message_attributes.insert(name.into(), value.into());
        self
    }

    /// Execute the publish operation.
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<operation::publish::PublishOutput, error::SdkError<operation::publish::PublishError>>
    {
        let publish: PublishInput = self.try_into()?;
        publish.send(client).await
    }
}

impl TryFrom<Publish> for PublishInput {
    type Error = error::BuildError;

    fn try_from(publish: Publish) -> Result<Self, Self::Error> {
        if publish.topic_arn.is_empty() {
            return Err(error::BuildError::missing_field(
                "topic_arn",
                "topic arn cannot be empty",
            ));
        }
        let message_attributes = if publish.message_attributes.is_empty() {
            None
        } else {
            let mut message_attributes =
                collections::HashMap::with_capacity(publish.message_attributes.len());
            for (name, value) in publish.message_attributes {
                let value = types::MessageAttributeValue::builder()
                    .data_type(STRING_DATA_TYPE)
                    .string_value(value)
                    .build()?;
                message_attributes.insert(name, value);
            }
            Some(message_attributes)
        };
        let operation = Self {
            message: publish.message,
            message_attributes,
            topic_arn: publish.topic_arn,
        };
        Ok(operation)
    }
}

impl PublishInput {
    #[tracing::instrument(
        name = "aws_utils.sns.publish",
        skip_all,
        fields(topic = %self.topic_arn),
        err
    )]
    async fn send(
        self,
        client: &Client,
    ) -> Result<operation::publish::PublishOutput, error::SdkError<operation::publish::PublishError>>
    {
        client
            .publish()
            .message(self.message)
            .set_message_attributes(self.message_attributes)
            .topic_arn(self.topic_arn)
            .send()
            .await
    }
}

/// Publish `message` as JSON to `topic_arn` and return the message id.
pub async fn send_message<T: Serialize + ?Sized>(topic_arn: &str, message: &T) -> Result<String> {
    send_message_with_attributes(topic_arn, message, collections::HashMap::new()).await
}

/// Publish `message` as JSON with `String` typed message attributes and return the
/// message id.
pub async fn send_message_with_attributes<T: Serialize + ?Sized>(
    topic_arn: &str,
    message: &T,
    message_attributes: collections::HashMap<String, String>,
) -> Result<String> {
    if topic_arn.is_empty() {
        return Err(Error::InvalidArgument("topic arn cannot be empty".to_string()));
    }
    let publish = Publish {
        message_attributes,
        ..Publish::json(topic_arn, message)?
    };
    let publish: PublishInput = publish
        .try_into()
        .map_err(|error: error::BuildError| Error::InvalidArgument(error.to_string()))?;
    let message = publish.message.clone();
    let client = session::get().await.sns();
    let output = publish
        .send(&client)
        .await
        .map_err(aws_sdk_sns::Error::from)?;
    tracing::info!(topic = topic_arn, message = %message, "message sent");
    output.message_id.ok_or(Error::MissingField("MessageId"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use serde_json::json;

    fn string_attribute(value: &str) -> types::MessageAttributeValue {
        types::MessageAttributeValue::builder()
            .data_type("String")
            .string_value(value)
            .build()
            .unwrap()
    }

    #[rstest]
    #[case::plain(
        Publish::json("arn:a", &json!({"id": 1})).unwrap(),
        PublishInput {
            message: r#"{"id":1}"#.to_string(),
            message_attributes: None,
            topic_arn: "arn:a".to_string(),
        }
    )]
    #[case::with_attributes(
        Publish::json("arn:a", "b").unwrap().with_attribute("c", "d").with_attribute("e", "f"),
        PublishInput {
            message: r#""b""#.to_string(),
            message_attributes: Some(
                collections::HashMap::from(
                    [
                        ("c".to_string(), string_attribute("d")),
                        ("e".to_string(), string_attribute("f")),
                    ]
                )
            ),
            topic_arn: "arn:a".to_string(),
        }
    )]
    fn test_publish(#[case] args: Publish, #[case] expected: PublishInput) {
        let actual: PublishInput = args.try_into().unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_publish_rejects_empty_topic_arn() {
        let actual: Result<PublishInput, error::BuildError> =
            Publish::json("", "a").unwrap().try_into();
        assert!(actual.is_err());
    }

    #[tokio::test]
    async fn test_send_message_rejects_empty_topic_arn() {
        let actual = send_message("", &json!({"id": 1})).await;
        assert!(matches!(
            actual,
            Err(Error::InvalidArgument(message)) if message == "topic arn cannot be empty"
        ));
    }
}
