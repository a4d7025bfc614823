//! SQS helpers: send, receive and delete messages.

use crate::{Error, Result, session};

use aws_sdk_sqs::{Client, error, operation, types};
use std::{collections, ops};

/// Bounds SQS puts on the number of messages returned by one receive.
pub const MAX_NUMBER_OF_MESSAGES: ops::RangeInclusive<i32> = 1..=10;

const STRING_DATA_TYPE: &str = "String";

/// send message operation
#[derive(Clone, Debug, Default, PartialEq)]
struct SendMessageInput {
    delay_seconds: Option<i32>,
    message_attributes: Option<collections::HashMap<String, types::MessageAttributeValue>>,
    message_body: String,
    queue_url: String,
}

/// Send message operation.
///
/// ```rust,no_run
/// use aws_sdk_sqs::Client;
/// use aws_utils::sqs;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let send_message = sqs::SendMessage {
///     delay_seconds: Some(5),
///     ..sqs::SendMessage::new("http://localhost:4576/queue/jobs", "run")
/// };
/// send_message.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SendMessage {
    /// Message body.
    pub body: String,
    /// Seconds the message stays invisible after being sent.
    pub delay_seconds: Option<i32>,
    /// `String` typed message attributes.
    pub message_attributes: collections::HashMap<String, String>,
    /// URL of the queue.
    pub queue_url: String,
}

impl SendMessage {
    /// Send `body` to `queue_url`.
    pub fn new(queue_url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            queue_url: queue_url.into(),
            ..Default::default()
        }
    }

    /// Add a `String` typed message attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.message_attributes.insert(name.into(), value.into());
        self
    }

    /// Execute the send message operation.
    #[tracing::instrument(
        name = "aws_utils.sqs.send_message",
        skip_all,
        fields(queue = %self.queue_url),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::send_message::SendMessageOutput,
        error::SdkError<operation::send_message::SendMessageError>,
    > {
        let send_message: SendMessageInput = self.try_into()?;
        client
            .send_message()
            .set_delay_seconds(send_message.delay_seconds)
            .set_message_attributes(send_message.message_attributes)
            .message_body(send_message.message_body)
            .queue_url(send_message.queue_url)
            .send()
            .await
    }
}

impl TryFrom<SendMessage> for SendMessageInput {
    type Error = error::BuildError;

    fn try_from(send_message: SendMessage) -> Result<Self, Self::Error> {
        let message_attributes = if send_message.message_attributes.is_empty() {
            None
        } else {
            let mut message_attributes =
                collections::HashMap::with_capacity(send_message.message_attributes.len());
            for (name, value) in send_message.message_attributes {
                let value = types::MessageAttributeValue::builder()
                    .data_type(STRING_DATA_TYPE)
                    .string_value(value)
                    .build()?;
                message_attributes.insert(name, value);
            }
            Some(message_attributes)
        };
        let operation = Self {
            delay_seconds: send_message.delay_seconds,
            message_attributes,
            message_body: send_message.body,
            queue_url: send_message.queue_url,
        };
        Ok(operation)
    }
}

/// Receive message operation.
#[derive(Clone, Debug, PartialEq)]
pub struct ReceiveMessage {
    /// How many messages to return at most, within [`MAX_NUMBER_OF_MESSAGES`].
    pub max_number_of_messages: i32,
    /// URL of the queue.
    pub queue_url: String,
    /// Seconds received messages stay hidden from other receivers.
    pub visibility_timeout: Option<i32>,
    /// Long polling duration in seconds.
    pub wait_time_seconds: Option<i32>,
}

impl ReceiveMessage {
    /// Receive up to `max_number_of_messages` messages from `queue_url`.
    pub fn new(queue_url: impl Into<String>, max_number_of_messages: i32) -> Self {
        Self {
            max_number_of_messages,
            queue_url: queue_url.into(),
            visibility_timeout: None,
            wait_time_seconds: None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if MAX_NUMBER_OF_MESSAGES.contains(&self.max_number_of_messages) {
            Ok(())
        } else {
            Err(format!(
                "max number of messages must be between {} and {}, got {}",
                MAX_NUMBER_OF_MESSAGES.start(),
                MAX_NUMBER_OF_MESSAGES.end(),
                self.max_number_of_messages
            ))
        }
    }

    /// Execute the receive message operation.
    #[tracing::instrument(
        name = "aws_utils.sqs.receive_message",
        skip_all,
        fields(queue = %self.queue_url, max = self.max_number_of_messages),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::receive_message::ReceiveMessageOutput,
        error::SdkError<operation::receive_message::ReceiveMessageError>,
    > {
        self.validate()
            .map_err(|message| error::BuildError::invalid_field("max_number_of_messages", message))?;
        client
            .receive_message()
            .max_number_of_messages(self.max_number_of_messages)
            .queue_url(self.queue_url)
            .set_visibility_timeout(self.visibility_timeout)
            .set_wait_time_seconds(self.wait_time_seconds)
            .send()
            .await
    }
}

/// Delete message operation.
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteMessage {
    /// URL of the queue.
    pub queue_url: String,
    /// Receipt handle obtained when the message was received.
    pub receipt_handle: String,
}

impl DeleteMessage {
    /// Delete the message received with `receipt_handle` from `queue_url`.
    pub fn new(queue_url: impl Into<String>, receipt_handle: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            receipt_handle: receipt_handle.into(),
        }
    }

    /// Execute the delete message operation.
    #[tracing::instrument(
        name = "aws_utils.sqs.delete_message",
        skip_all,
        fields(queue = %self.queue_url),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::delete_message::DeleteMessageOutput,
        error::SdkError<operation::delete_message::DeleteMessageError>,
    > {
        client
            .delete_message()
            .queue_url(self.queue_url)
            .receipt_handle(self.receipt_handle)
            .send()
            .await
    }
}

/// A received message.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Message id assigned by SQS.
    pub message_id: String,
    /// Handle needed to delete the message.
    pub receipt_handle: String,
    /// Message body.
    pub body: String,
}

impl TryFrom<types::Message> for Message {
    type Error = Error;

    fn try_from(message: types::Message) -> Result<Self> {
        Ok(Self {
            message_id: message.message_id.ok_or(Error::MissingField("MessageId"))?,
            receipt_handle: message
                .receipt_handle
                .ok_or(Error::MissingField("ReceiptHandle"))?,
            body: message.body.unwrap_or_default(),
        })
    }
}

/// Send `body` to `queue_url` and return the message id.
pub async fn send_message(queue_url: &str, body: impl Into<String>) -> Result<String> {
    let client = session::get().await.sqs();
    let output = SendMessage::new(queue_url, body)
        .send(&client)
        .await
        .map_err(aws_sdk_sqs::Error::from)?;
    output.message_id.ok_or(Error::MissingField("MessageId"))
}

/// Receive up to `max_number_of_messages` messages from `queue_url`.
///
/// An empty queue yields an empty vector.
pub async fn receive_messages(queue_url: &str, max_number_of_messages: i32) -> Result<Vec<Message>> {
    let receive_message = ReceiveMessage::new(queue_url, max_number_of_messages);
    receive_message.validate().map_err(Error::InvalidArgument)?;
    let client = session::get().await.sqs();
    let output = receive_message
        .send(&client)
        .await
        .map_err(aws_sdk_sqs::Error::from)?;
    output
        .messages
        .unwrap_or_default()
        .into_iter()
        .map(Message::try_from)
        .collect()
}

/// Delete the message received with `receipt_handle` from `queue_url`.
pub async fn delete_message(queue_url: &str, receipt_handle: &str) -> Result<()> {
    let client = session::get().await.sqs();
    DeleteMessage::new(queue_url, receipt_handle)
        .send(&client)
        .await
        .map_err(aws_sdk_sqs::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::plain(
        SendMessage::new("a", "b"),
        SendMessageInput {
            message_body: "b".to_string(),
            queue_url: "a".to_string(),
            ..Default::default()
        }
    )]
    #[case::delayed_with_attributes(
        SendMessage {
            delay_seconds: Some(10),
            ..SendMessage::new("a", "b").with_attribute("c", "d")
        },
        SendMessageInput {
            delay_seconds: Some(10),
            message_attributes: Some(
                collections::HashMap::from(
                    [
                        (
                            "c".to_string(),
                            types::MessageAttributeValue::builder()
                                .data_type("String")
                                .string_value("d")
                                .build()
                                .unwrap(),
                        ),
                    ]
                )
            ),
            message_body: "b".to_string(),
            queue_url: "a".to_string(),
        }
    )]
    fn test_send_message(#[case] args: SendMessage, #[case] expected: SendMessageInput) {
        let actual: SendMessageInput = args.try_into().unwrap();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::min(1, true)]
    #[case::max(10, true)]
    #[case::zero(0, false)]
    #[case::above_max(11, false)]
    #[case::negative(-1, false)]
    fn test_receive_message_bounds(#[case] max_number_of_messages: i32, #[case] valid: bool) {
        let receive_message = ReceiveMessage::new("a", max_number_of_messages);
        assert_eq!(receive_message.validate().is_ok(), valid);
    }

    #[tokio::test]
    async fn test_receive_messages_rejects_out_of_bounds() {
        let actual = receive_messages("a", 11).await;
        assert!(matches!(
            actual,
            Err(Error::InvalidArgument(message))
                if message == "max number of messages must be between 1 and 10, got 11"
        ));
    }

    #[rstest]
    #[case::complete(
        types::Message::builder().message_id("a").receipt_handle("b").body("c").build(),
        Some(Message {
            message_id: "a".to_string(),
            receipt_handle: "b".to_string(),
            body: "c".to_string(),
        })
    )]
    #[case::empty_body(
        types::Message::builder().message_id("a").receipt_handle("b").build(),
        Some(Message {
            message_id: "a".to_string(),
            receipt_handle: "b".to_string(),
            body: String::new(),
        })
    )]
    #[case::missing_receipt_handle(
        types::Message::builder().message_id("a").body("c").build(),
        None
    )]
    fn test_message(#[case] message: types::Message, #[case] expected: Option<Message>) {
        assert_eq!(Message::try_from(message).ok(), expected);
    }
}
