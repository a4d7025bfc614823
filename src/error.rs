use crate::localstack;

/// Result alias used by every convenience function of the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by the convenience functions.
///
/// SDK failures are carried verbatim, one variant per service. On top of them,
/// DynamoDB lookups synthesize two sentinel conditions:
/// [`Error::ItemNotFound`] and [`Error::MultipleItemsFound`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The lookup succeeded but no matching item exists.
    #[error("ItemNotFoundException")]
    ItemNotFound,

    /// A lookup that expects a single item matched more than one.
    #[error("MultipleItemsFound")]
    MultipleItemsFound,

    /// DynamoDB service error.
    #[error(transparent)]
    DynamoDb(#[from] aws_sdk_dynamodb::Error),

    /// S3 service error.
    #[error(transparent)]
    S3(#[from] aws_sdk_s3::Error),

    /// S3 GetObject failure, reported with the object it was reading.
    #[error("could not retrieve object from bucket [{bucket}] key [{key}]: {source}")]
    GetObject {
        /// Bucket of the object.
        bucket: String,
        /// Key of the object.
        key: String,
        /// Underlying SDK error.
        #[source]
        source: aws_sdk_s3::Error,
    },

    /// Failure while streaming an S3 object body.
    #[error("failed to read object body: {0}")]
    ByteStream(#[from] aws_sdk_s3::primitives::ByteStreamError),

    /// SNS service error.
    #[error(transparent)]
    Sns(#[from] aws_sdk_sns::Error),

    /// SQS service error.
    #[error(transparent)]
    Sqs(#[from] aws_sdk_sqs::Error),

    /// Cognito Identity Provider (user pools) service error.
    #[error(transparent)]
    CognitoIdentityProvider(#[from] aws_sdk_cognitoidentityprovider::Error),

    /// Cognito Identity (identity pools) service error.
    #[error(transparent)]
    CognitoIdentity(#[from] aws_sdk_cognitoidentity::Error),

    /// Conversion between Rust values and DynamoDB attribute values failed.
    #[error(transparent)]
    Serialization(#[from] serde_dynamo::Error),

    /// JSON encoding of a message body failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Object content is not valid UTF-8.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),

    /// An argument was rejected before any request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A field the caller depends on was absent from the service response.
    #[error("missing field `{0}` in response")]
    MissingField(&'static str),

    /// LocalStack harness failure.
    #[error(transparent)]
    Localstack(#[from] localstack::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::item_not_found(Error::ItemNotFound, "ItemNotFoundException")]
    #[case::multiple_items_found(Error::MultipleItemsFound, "MultipleItemsFound")]
    #[case::invalid_argument(
        Error::InvalidArgument("topic arn cannot be empty".to_string()),
        "invalid argument: topic arn cannot be empty"
    )]
    #[case::missing_field(
        Error::MissingField("IdentityId"),
        "missing field `IdentityId` in response"
    )]
    fn test_display(#[case] error: Error, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_sentinels_are_matchable() {
        let error = Error::ItemNotFound;
        assert!(matches!(error, Error::ItemNotFound));
        assert!(!matches!(error, Error::MultipleItemsFound));
    }
}
