//! Middleware for protecting authenticated routes.
//!
//! Accepts only an `Authorization: Bearer <token>` header carrying a valid
//! access token. Every rejection produces the same 401 response; the reason
//! is logged at debug level only.

use crate::api::common::ApiResponse;
use crate::auth::models::AuthenticatedUser;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Request, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BearerError {
    #[error("authorization header missing")]
    Missing,
    #[error("authorization header is not `Bearer <token>`")]
    Malformed,
    #[error("access token rejected")]
    Rejected,
}

/// Extracts the token from a header value of exactly `Bearer <token>`.
pub fn parse_bearer(header: &str) -> Result<&str, BearerError> {
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(BearerError::Malformed)?;

    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(BearerError::Malformed);
    }

    Ok(token)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    let header = headers.get(AUTHORIZATION).ok_or(BearerError::Missing)?;
    let header = header.to_str().map_err(|_| BearerError::Malformed)?;
    parse_bearer(header)
}

/// Resolves the request's bearer token to a verified user.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, BearerError> {
    let token = bearer_token(headers)?;
    state
        .auth
        .verify_access_token(token)
        .map_err(|_| BearerError::Rejected)
}

/// JWT authentication middleware
pub async fn jwt_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(reason) => {
            tracing::debug!(%reason, path = %request.uri().path(), "request rejected");
            unauthorized()
        }
    }
}

fn unauthorized() -> Response {
    let body = ApiResponse::<()>::error("Unauthorized", "unauthorized");
    let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    response
        .headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}
