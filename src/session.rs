//! Process-wide AWS session.
//!
//! Every convenience function of the crate takes its client from a single, lazily
//! initialized [`Session`]. The session is read-only once loaded: call [`init`] (or
//! [`init_with_sdk_config`]) before the first AWS call to pick its configuration,
//! otherwise [`get`] loads it from the environment.
//!
//! ```rust,no_run
//! use aws_utils::session;
//!
//! # async fn example() {
//! let session = session::init(session::SessionConfig::from_env()).await;
//! let dynamodb = session.dynamodb();
//! # }
//! ```

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use tokio::sync::OnceCell;

static SESSION: OnceCell<Session> = OnceCell::const_new();

const PROVIDER_NAME: &str = "aws-utils";

/// Where the session takes its credentials from.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CredentialsSource {
    /// `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN` only.
    #[default]
    Environment,
    /// The SDK's default provider chain (environment, profile, container, IMDS...).
    DefaultChain,
    /// Fixed credentials.
    Static {
        /// Access key id.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Optional session token.
        session_token: Option<String>,
    },
}

/// Configuration used to load the session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionConfig {
    /// Region override; the SDK region chain applies when `None`.
    pub region: Option<String>,
    /// Endpoint override applied to every service client (e.g. LocalStack).
    pub endpoint_url: Option<String>,
    /// Credentials source.
    pub credentials: CredentialsSource,
    /// Use path-style addressing (`{endpoint}/{bucket}/{key}`) for S3.
    pub force_path_style: bool,
}

impl SessionConfig {
    /// Build a configuration from the process environment.
    ///
    /// Reads `AWS_REGION` (falling back to `AWS_DEFAULT_REGION`), `AWS_ENDPOINT_URL` and
    /// `AWS_S3_FORCE_PATH_STYLE`. Credentials come from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let force_path_style = non_empty("AWS_S3_FORCE_PATH_STYLE")
            .is_some_and(|value| matches!(value.trim(), "1" | "true" | "TRUE" | "True"));
        Self {
            region: non_empty("AWS_REGION").or_else(|| non_empty("AWS_DEFAULT_REGION")),
            endpoint_url: non_empty("AWS_ENDPOINT_URL"),
            credentials: CredentialsSource::Environment,
            force_path_style,
        }
    }

    /// Configuration for a LocalStack endpoint: dummy static credentials, `us-east-1` and
    /// path-style S3 addressing.
    pub fn localstack(endpoint_url: impl Into<String>) -> Self {
        Self {
            region: Some("us-east-1".to_string()),
            endpoint_url: Some(endpoint_url.into()),
            credentials: CredentialsSource::Static {
                access_key_id: "test".to_string(),
                secret_access_key: "test".to_string(),
                session_token: None,
            },
            force_path_style: true,
        }
    }

    /// Load the SDK configuration described by `self`.
    pub async fn load(self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = self.region {
            loader = loader.region(Region::new(region));
        }
        if let Some(endpoint_url) = self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        loader = match self.credentials {
            CredentialsSource::Environment => loader.credentials_provider(
                aws_config::environment::EnvironmentVariableCredentialsProvider::new(),
            ),
            CredentialsSource::DefaultChain => loader,
            CredentialsSource::Static {
                access_key_id,
                secret_access_key,
                session_token,
            } => loader.credentials_provider(Credentials::new(
                access_key_id,
                secret_access_key,
                session_token,
                None,
                PROVIDER_NAME,
            )),
        };
        loader.load().await
    }
}

/// Shared AWS context from which every service client is built.
#[derive(Clone, Debug)]
pub struct Session {
    sdk_config: SdkConfig,
    force_path_style: bool,
}

impl Session {
    /// Wrap an already loaded SDK configuration.
    pub fn new(sdk_config: SdkConfig, force_path_style: bool) -> Self {
        Self {
            sdk_config,
            force_path_style,
        }
    }

    /// Load a session from `config`.
    pub async fn load(config: SessionConfig) -> Self {
        let force_path_style = config.force_path_style;
        let sdk_config = config.load().await;
        Self::new(sdk_config, force_path_style)
    }

    /// The underlying SDK configuration.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.sdk_config
    }

    /// Whether S3 uses path-style addressing.
    pub fn force_path_style(&self) -> bool {
        self.force_path_style
    }

    /// DynamoDB client.
    pub fn dynamodb(&self) -> aws_sdk_dynamodb::Client {
        aws_sdk_dynamodb::Client::new(&self.sdk_config)
    }

    /// S3 client, honouring path-style addressing.
    pub fn s3(&self) -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::config::Builder::from(&self.sdk_config)
            .force_path_style(self.force_path_style)
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }

    /// SNS client.
    pub fn sns(&self) -> aws_sdk_sns::Client {
        aws_sdk_sns::Client::new(&self.sdk_config)
    }

    /// SQS client.
    pub fn sqs(&self) -> aws_sdk_sqs::Client {
        aws_sdk_sqs::Client::new(&self.sdk_config)
    }

    /// Cognito Identity Provider (user pools) client.
    pub fn cognito_identity_provider(&self) -> aws_sdk_cognitoidentityprovider::Client {
        aws_sdk_cognitoidentityprovider::Client::new(&self.sdk_config)
    }

    /// Cognito Identity (identity pools) client.
    pub fn cognito_identity(&self) -> aws_sdk_cognitoidentity::Client {
        aws_sdk_cognitoidentity::Client::new(&self.sdk_config)
    }
}

/// Initialize the process-wide session from `config`.
///
/// Only the first initialization takes effect; later calls return the existing session.
pub async fn init(config: SessionConfig) -> &'static Session {
    init_once(|| Session::load(config)).await
}

/// Initialize the process-wide session with an already loaded SDK configuration.
///
/// Only the first initialization takes effect; later calls return the existing session.
pub async fn init_with_sdk_config(sdk_config: SdkConfig, force_path_style: bool) -> &'static Session {
    init_once(|| async move { Session::new(sdk_config, force_path_style) }).await
}

async fn init_once<F, Fut>(load: F) -> &'static Session
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Session>,
{
    let mut loaded = false;
    let session = SESSION
        .get_or_init(|| {
            loaded = true;
            load()
        })
        .await;
    if !loaded {
        tracing::warn!("session already initialized, ignoring new configuration");
    }
    session
}

/// The process-wide session, loaded from [`SessionConfig::from_env`] on first use.
pub async fn get() -> &'static Session {
    SESSION
        .get_or_init(|| {
            tracing::debug!("initializing session from environment");
            Session::load(SessionConfig::from_env())
        })
        .await
}
