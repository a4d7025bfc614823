//! S3 helpers: object download, upload and listing.

use crate::{Error, Result, session};

use aws_sdk_s3::{Client, error, operation, primitives};

/// Get object operation.
#[derive(Clone, Debug, PartialEq)]
pub struct GetObject {
    /// Bucket holding the object.
    pub bucket: String,
    /// Key of the object.
    pub key: String,
}

impl GetObject {
    /// Get `key` from `bucket`.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Execute the get object operation.
    #[tracing::instrument(
        name = "aws_utils.s3.get_object",
        skip_all,
        fields(bucket = %self.bucket, key = %self.key),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::get_object::GetObjectOutput,
        error::SdkError<operation::get_object::GetObjectError>,
    > {
        client
            .get_object()
            .bucket(self.bucket)
            .key(self.key)
            .send()
            .await
    }
}

/// Put object operation.
///
/// ```rust,no_run
/// use aws_sdk_s3::Client;
/// use aws_utils::s3;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let put_object = s3::PutObject {
///     content_type: Some("application/json".to_string()),
///     ..s3::PutObject::new("reports", "2024/01.json", r#"{"total": 3}"#)
/// };
/// put_object.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PutObject {
    /// Bucket to upload into.
    pub bucket: String,
    /// Key of the object.
    pub key: String,
    /// Object content.
    pub body: Vec<u8>,
    /// MIME type stored with the object.
    pub content_type: Option<String>,
}

impl PutObject {
    /// Upload `body` as `key` into `bucket`.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            body: body.into(),
            content_type: None,
        }
    }

    /// Execute the put object operation.
    #[tracing::instrument(
        name = "aws_utils.s3.put_object",
        skip_all,
        fields(bucket = %self.bucket, key = %self.key, size = self.body.len()),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::put_object::PutObjectOutput,
        error::SdkError<operation::put_object::PutObjectError>,
    > {
        client
            .put_object()
            .bucket(self.bucket)
            .key(self.key)
            .body(primitives::ByteStream::from(self.body))
            .set_content_type(self.content_type)
            .send()
            .await
    }
}

/// List objects operation (ListObjectsV2), following every page.
#[derive(Clone, Debug, PartialEq)]
pub struct ListObjects {
    /// Bucket to list.
    pub bucket: String,
    /// Only keys starting with this prefix are listed.
    pub prefix: Option<String>,
}

impl ListObjects {
    /// List the keys of `bucket` starting with `prefix`; an empty prefix lists everything.
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            bucket: bucket.into(),
            prefix: (!prefix.is_empty()).then_some(prefix),
        }
    }

    /// Execute the listing and return the keys of every page.
    #[tracing::instrument(
        name = "aws_utils.s3.list_objects",
        skip_all,
        fields(bucket = %self.bucket, prefix = ?self.prefix),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<Vec<String>, error::SdkError<operation::list_objects_v2::ListObjectsV2Error>> {
        let mut pages = client
            .list_objects_v2()
            .bucket(self.bucket)
            .set_prefix(self.prefix)
            .into_paginator()
            .send();
        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page?;
            keys.extend(
                page.contents
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|object| object.key),
            );
        }
        Ok(keys)
    }
}

/// URL of an uploaded object.
///
/// With a custom endpoint or path-style addressing the URL is `{endpoint}/{bucket}/{key}`,
/// otherwise the virtual-hosted `https://{bucket}.s3.{region}.amazonaws.com/{key}`. Each
/// `/`-separated segment of the key is percent-encoded.
fn object_url(
    endpoint_url: Option<&str>,
    region: Option<&str>,
    force_path_style: bool,
    bucket: &str,
    key: &str,
) -> String {
    let key = key
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");
    match (endpoint_url, region) {
        (Some(endpoint_url), _) => format!("{}/{bucket}/{key}", endpoint_url.trim_end_matches('/')),
        (None, Some(region)) if force_path_style => {
            format!("https://s3.{region}.amazonaws.com/{bucket}/{key}")
        }
        (None, Some(region)) => format!("https://{bucket}.s3.{region}.amazonaws.com/{key}"),
        (None, None) if force_path_style => format!("https://s3.amazonaws.com/{bucket}/{key}"),
        (None, None) => format!("https://{bucket}.s3.amazonaws.com/{key}"),
    }
}

/// Download an object and return its raw content.
pub async fn get_object(bucket: &str, key: &str) -> Result<Vec<u8>> {
    let client = session::get().await.s3();
    let output = GetObject::new(bucket, key)
        .send(&client)
        .await
        .map_err(|source| Error::GetObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source: source.into(),
        })?;
    let data = output.body.collect().await?;
    Ok(data.into_bytes().to_vec())
}

/// Download an object and return its content as UTF-8 text.
pub async fn get_object_as_string(bucket: &str, key: &str) -> Result<String> {
    let data = get_object(bucket, key).await?;
    Ok(String::from_utf8(data)?)
}

/// Upload `body` as `key` into `bucket` and return the URL of the object.
pub async fn put_object(bucket: &str, key: &str, body: impl Into<Vec<u8>>) -> Result<String> {
    let session = session::get().await;
    PutObject::new(bucket, key, body)
        .send(&session.s3())
        .await
        .map_err(aws_sdk_s3::Error::from)?;
    let sdk_config = session.sdk_config();
    let location = object_url(
        sdk_config.endpoint_url(),
        sdk_config.region().map(|region| region.as_ref()),
        session.force_path_style(),
        bucket,
        key,
    );
    tracing::info!(location = %location, "object uploaded");
    Ok(location)
}

/// Keys of the objects of `bucket` starting with `prefix`.
pub async fn list_objects(bucket: &str, prefix: &str) -> Result<Vec<String>> {
    let client = session::get().await.s3();
    let keys = ListObjects::new(bucket, prefix)
        .send(&client)
        .await
        .map_err(aws_sdk_s3::Error::from)?;
    Ok(keys)
}
