//! Cognito helpers: user pool administration, the custom authentication flow and
//! identity pool lookups.

use crate::{Error, Result, session};

use aws_sdk_cognitoidentityprovider::{Client, error, operation, types};
use indexmap::IndexMap;
use std::collections;

const USERNAME_PARAMETER: &str = "USERNAME";
const ANSWER_PARAMETER: &str = "ANSWER";
const USERNAME_ATTRIBUTE: &str = "username";

/// admin create user operation
#[derive(Clone, Debug, Default, PartialEq)]
struct AdminCreateUserInput {
    user_attributes: Option<Vec<types::AttributeType>>,
    user_pool_id: String,
    username: String,
}

/// Admin create user operation.
///
/// ```rust,no_run
/// use aws_sdk_cognitoidentityprovider::Client;
/// use aws_utils::cognito;
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let create_user = cognito::AdminCreateUser::new("us-east-1_pool", "john")
///     .with_attribute("email", "john@example.com");
/// create_user.send(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdminCreateUser {
    /// User attributes, sent in insertion order.
    pub attributes: IndexMap<String, String>,
    /// User pool to create the user in.
    pub user_pool_id: String,
    /// Name of the new user.
    pub username: String,
}

impl AdminCreateUser {
    /// Create `username` in `user_pool_id`.
    pub fn new(user_pool_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            attributes: IndexMap::new(),
            user_pool_id: user_pool_id.into(),
            username: username.into(),
        }
    }

    /// Add a user attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Execute the admin create user operation.
    #[tracing::instrument(
        name = "aws_utils.cognito.admin_create_user",
        skip_all,
        fields(user_pool_id = %self.user_pool_id, username = %self.username),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::admin_create_user::AdminCreateUserOutput,
        error::SdkError<operation::admin_create_user::AdminCreateUserError>,
    > {
        let admin_create_user: AdminCreateUserInput = self.try_into()?;
        client
            .admin_create_user()
            .set_user_attributes(admin_create_user.user_attributes)
            .user_pool_id(admin_create_user.user_pool_id)
            .username(admin_create_user.username)
            .send()
            .await
    }
}

impl TryFrom<AdminCreateUser> for AdminCreateUserInput {
    type Error = error::BuildError;

    fn try_from(admin_create_user: AdminCreateUser) -> Result<Self, Self::Error> {
        let user_attributes = if admin_create_user.attributes.is_empty() {
            None
        } else {
            let user_attributes = admin_create_user
                .attributes
                .into_iter()
                .map(|(name, value)| types::AttributeType::builder().name(name).value(value).build())
                .collect::<Result<Vec<_>, _>>()?;
            Some(user_attributes)
        };
        let operation = Self {
            user_attributes,
            user_pool_id: admin_create_user.user_pool_id,
            username: admin_create_user.username,
        };
        Ok(operation)
    }
}

/// Start of the custom authentication flow (`CUSTOM_AUTH`).
#[derive(Clone, Debug, PartialEq)]
pub struct InitiateAuth {
    /// App client id.
    pub client_id: String,
    /// User to authenticate.
    pub username: String,
}

impl InitiateAuth {
    fn auth_parameters(&self) -> collections::HashMap<String, String> {
        collections::HashMap::from([(USERNAME_PARAMETER.to_string(), self.username.clone())])
    }

    /// Execute the initiate auth operation.
    #[tracing::instrument(
        name = "aws_utils.cognito.initiate_auth",
        skip_all,
        fields(username = %self.username),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::initiate_auth::InitiateAuthOutput,
        error::SdkError<operation::initiate_auth::InitiateAuthError>,
    > {
        client
            .initiate_auth()
            .auth_flow(types::AuthFlowType::CustomAuth)
            .set_auth_parameters(Some(self.auth_parameters()))
            .client_id(self.client_id)
            .send()
            .await
    }
}

/// Answer to a `CUSTOM_CHALLENGE` issued by [`InitiateAuth`].
#[derive(Clone, Debug, PartialEq)]
pub struct RespondToAuthChallenge {
    /// Challenge answer.
    pub answer: String,
    /// App client id.
    pub client_id: String,
    /// Session returned with the challenge.
    pub session: Option<String>,
    /// User being authenticated.
    pub username: String,
}

impl RespondToAuthChallenge {
    fn challenge_responses(&self) -> collections::HashMap<String, String> {
        collections::HashMap::from([
            (USERNAME_PARAMETER.to_string(), self.username.clone()),
            (ANSWER_PARAMETER.to_string(), self.answer.clone()),
        ])
    }

    /// Execute the respond to auth challenge operation.
    #[tracing::instrument(
        name = "aws_utils.cognito.respond_to_auth_challenge",
        skip_all,
        fields(username = %self.username),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<
        operation::respond_to_auth_challenge::RespondToAuthChallengeOutput,
        error::SdkError<operation::respond_to_auth_challenge::RespondToAuthChallengeError>,
    > {
        client
            .respond_to_auth_challenge()
            .challenge_name(types::ChallengeNameType::CustomChallenge)
            .set_challenge_responses(Some(self.challenge_responses()))
            .client_id(self.client_id)
            .set_session(self.session)
            .send()
            .await
    }
}

/// Identity pool lookup of the identity id bound to a login token.
#[derive(Clone, Debug, PartialEq)]
pub struct GetId {
    /// Identity pool to look into.
    pub identity_pool_id: String,
    /// Login tokens by provider name.
    pub logins: collections::HashMap<String, String>,
}

impl GetId {
    /// Execute the get id operation.
    #[tracing::instrument(
        name = "aws_utils.cognito.get_id",
        skip_all,
        fields(identity_pool_id = %self.identity_pool_id),
        err
    )]
    pub async fn send(
        self,
        client: &aws_sdk_cognitoidentity::Client,
    ) -> Result<
        aws_sdk_cognitoidentity::operation::get_id::GetIdOutput,
        aws_sdk_cognitoidentity::error::SdkError<
            aws_sdk_cognitoidentity::operation::get_id::GetIdError,
        >,
    > {
        client
            .get_id()
            .identity_pool_id(self.identity_pool_id)
            .set_logins(Some(self.logins))
            .send()
            .await
    }
}

/// List users operation, following every page.
#[derive(Clone, Debug, PartialEq)]
pub struct ListUsers {
    /// Cognito filter expression, e.g. `email ^= "john"`.
    pub filter: Option<String>,
    /// User pool to list.
    pub user_pool_id: String,
}

impl ListUsers {
    /// List every user of `user_pool_id`.
    pub fn new(user_pool_id: impl Into<String>) -> Self {
        Self {
            filter: None,
            user_pool_id: user_pool_id.into(),
        }
    }

    /// List the users whose `attribute` starts with `prefix`.
    pub fn with_prefix_filter(mut self, attribute: &str, prefix: &str) -> Self {
        let prefix = prefix.replace('\\', "\\\\").replace('"', "\\\"");
        self.filter = Some(format!("{attribute} ^= \"{prefix}\""));
        self
    }

    /// Execute the list users operation.
    #[tracing::instrument(
        name = "aws_utils.cognito.list_users",
        skip_all,
        fields(user_pool_id = %self.user_pool_id, filter = ?self.filter),
        err
    )]
    pub async fn send(
        self,
        client: &Client,
    ) -> Result<Vec<types::UserType>, error::SdkError<operation::list_users::ListUsersError>> {
        let mut pages = client
            .list_users()
            .set_filter(self.filter)
            .user_pool_id(self.user_pool_id)
            .into_paginator()
            .send();
        let mut users = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page?;
            users.extend(page.users.unwrap_or_default());
        }
        Ok(users)
    }
}

fn attribute_values(users: Vec<types::UserType>, attribute: &str) -> Vec<String> {
    users
        .into_iter()
        .flat_map(|user| user.attributes.unwrap_or_default())
        .filter(|user_attribute| user_attribute.name == attribute)
        .filter_map(|user_attribute| user_attribute.value)
        .collect()
}

/// Create `username` in `user_pool_id` with `attributes`.
pub async fn create_user<K, V>(
    username: &str,
    attributes: impl IntoIterator<Item = (K, V)>,
    user_pool_id: &str,
) -> Result<()>
where
    K: Into<String>,
    V: Into<String>,
{
    let create_user = AdminCreateUser {
        attributes: attributes
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect(),
        ..AdminCreateUser::new(user_pool_id, username)
    };
    tracing::info!(
        user_pool_id,
        username,
        attributes = ?create_user.attributes,
        "creating user"
    );
    let client = session::get().await.cognito_identity_provider();
    create_user
        .send(&client)
        .await
        .map_err(aws_sdk_cognitoidentityprovider::Error::from)?;
    tracing::info!(username, "user created");
    Ok(())
}

/// Authenticate `username` through the custom challenge flow and return the identity id
/// of the resulting id token in `identity_pool_id`.
///
/// `token_provider` is the login provider name of the user pool, e.g.
/// `cognito-idp.us-east-1.amazonaws.com/us-east-1_pool`.
pub async fn get_user_identity_id(
    username: &str,
    password: &str,
    app_client_id: &str,
    identity_pool_id: &str,
    token_provider: &str,
) -> Result<String> {
    let session = session::get().await;
    let identity_provider = session.cognito_identity_provider();
    let initiate_auth = InitiateAuth {
        client_id: app_client_id.to_string(),
        username: username.to_string(),
    }
    .send(&identity_provider)
    .await
    .map_err(aws_sdk_cognitoidentityprovider::Error::from)?;
    let challenge = RespondToAuthChallenge {
        answer: password.to_string(),
        client_id: app_client_id.to_string(),
        session: initiate_auth.session,
        username: username.to_string(),
    }
    .send(&identity_provider)
    .await
    .map_err(aws_sdk_cognitoidentityprovider::Error::from)?;
    let id_token = challenge
        .authentication_result
        .and_then(|result| result.id_token)
        .ok_or(Error::MissingField("IdToken"))?;
    let output = GetId {
        identity_pool_id: identity_pool_id.to_string(),
        logins: collections::HashMap::from([(token_provider.to_string(), id_token)]),
    }
    .send(&session.cognito_identity())
    .await
    .map_err(aws_sdk_cognitoidentity::Error::from)?;
    output.identity_id.ok_or(Error::MissingField("IdentityId"))
}

/// Every user of `user_pool_id`.
pub async fn list_users(user_pool_id: &str) -> Result<Vec<types::UserType>> {
    let client = session::get().await.cognito_identity_provider();
    let users = ListUsers::new(user_pool_id)
        .send(&client)
        .await
        .map_err(aws_sdk_cognitoidentityprovider::Error::from)?;
    Ok(users)
}

/// User names of every user of `user_pool_id`.
pub async fn list_user_names(user_pool_id: &str) -> Result<Vec<String>> {
    let users = list_users(user_pool_id).await?;
    Ok(users.into_iter().filter_map(|user| user.username).collect())
}

/// Values of the `username` attribute of the users whose `attribute` starts with
/// `prefix`.
pub async fn list_users_with_prefix_filter(
    attribute: &str,
    prefix: &str,
    user_pool_id: &str,
) -> Result<Vec<String>> {
    let client = session::get().await.cognito_identity_provider();
    let users = ListUsers::new(user_pool_id)
        .with_prefix_filter(attribute, prefix)
        .send(&client)
        .await
        .map_err(aws_sdk_cognitoidentityprovider::Error::from)?;
    Ok(attribute_values(users, USERNAME_ATTRIBUTE))
}
