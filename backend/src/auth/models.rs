//! Request and response shapes for the authentication endpoints.
//!
//! Request fields default to empty strings so that an omitted field reaches
//! the service and is reported as a missing field, not as a body parse error.

use crate::database::models::User;
use crate::errors::ServiceError;
use crate::utils::jwt::Claims;
use serde::{Deserialize, Serialize};

/// Token type reported by every grant.
pub const TOKEN_TYPE: &str = "bearer";

/// Signup request payload
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Signup response
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub id: i64,
    pub email: String,
}

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login response. Tokens are only issued by the token endpoint.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub next: &'static str,
}

/// Form body of `POST /oauth/token`.
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub grant_type: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
}

/// A parsed token grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    Password { username: String, password: String },
    RefreshToken { refresh_token: String },
}

impl TryFrom<TokenRequest> for Grant {
    type Error = ServiceError;

    fn try_from(request: TokenRequest) -> Result<Self, Self::Error> {
        match request.grant_type.as_str() {
            "password" => Ok(Grant::Password {
                username: request.username.unwrap_or_default(),
                password: request.password.unwrap_or_default(),
            }),
            "refresh_token" => Ok(Grant::RefreshToken {
                refresh_token: request.refresh_token.unwrap_or_default(),
            }),
            "" => Err(ServiceError::validation("grant_type is required")),
            other => Err(ServiceError::validation(format!(
                "unsupported grant_type: {other}"
            ))),
        }
    }
}

/// Successful grant. `refresh_token` is only present for password grants.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Logout request payload
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Verified caller identity, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub claims: Claims,
}

/// Identity of the caller behind a verified access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
