//! Credential headers for hosted functions

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};

/// Header carrying the session token for `TokenHeaders` endpoints
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
/// Header carrying the user id for `TokenHeaders` endpoints
pub const USER_ID_HEADER: &str = "X-User-Id";

/// How an endpoint expects credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>`
    #[default]
    Bearer,
    /// `X-Auth-Token: <token>` and `X-User-Id: <user id>`
    TokenHeaders,
    /// No credentials
    None,
}

/// Signed-in user's credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub token: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: None,
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Attach credentials to a request according to `scheme`.
///
/// Nothing is attached when `credentials` is `None`.
pub fn apply_auth(
    builder: RequestBuilder,
    scheme: AuthScheme,
    credentials: Option<&Credentials>,
) -> RequestBuilder {
    let Some(creds) = credentials else {
        return builder;
    };

    match scheme {
        AuthScheme::Bearer => builder.bearer_auth(&creds.token),
        AuthScheme::TokenHeaders => {
            let builder = builder.header(AUTH_TOKEN_HEADER, &creds.token);
            match &creds.user_id {
                Some(user_id) => builder.header(USER_ID_HEADER, user_id),
                None => builder,
            }
        }
        AuthScheme::None => builder,
    }
}
