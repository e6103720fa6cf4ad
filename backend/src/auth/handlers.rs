//! Handler functions for authentication-related API endpoints.
//!
//! These functions decode request bodies, call into `auth::service` and turn
//! the outcome into HTTP responses.

use crate::api::common::{ApiError, ApiResponse, rejection_to_http, service_error_to_http};
use crate::auth::models::*;
use crate::state::AppState;
use axum::{
    extract::{
        Extension, Form, Json, State,
        rejection::{FormRejection, JsonRejection},
    },
    http::{StatusCode, header},
    response::IntoResponse,
};

/// Handle user signup request
#[axum::debug_handler(state = AppState)]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let Json(payload) = payload.map_err(rejection_to_http)?;

    let id = state
        .auth
        .signup(&payload.name, &payload.email, &payload.password)
        .await
        .map_err(service_error_to_http)?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id,
            email: payload.email,
        }),
    ))
}

/// Handle user login request. Verifies credentials only.
#[axum::debug_handler(state = AppState)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let Json(payload) = payload.map_err(rejection_to_http)?;

    let user = state
        .auth
        .login(&payload.email, &payload.password)
        .await
        .map_err(service_error_to_http)?;

    Ok(Json(ApiResponse::success(
        LoginResponse {
            user,
            next: "use /oauth/token with grant_type=password to receive access and refresh tokens",
        },
        "Login successful",
    )))
}

/// Handle `POST /oauth/token` for the password and refresh_token grants
#[axum::debug_handler(state = AppState)]
pub async fn token(
    State(state): State<AppState>,
    payload: Result<Form<TokenRequest>, FormRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Form(payload) = payload.map_err(rejection_to_http)?;
    let grant = Grant::try_from(payload).map_err(service_error_to_http)?;

    let response = state
        .auth
        .grant(grant)
        .await
        .map_err(service_error_to_http)?;

    Ok(([(header::CACHE_CONTROL, "no-store")], Json(response)))
}

/// Handle logout request by revoking the refresh token
#[axum::debug_handler(state = AppState)]
pub async fn logout(
    State(state): State<AppState>,
    payload: Result<Json<LogoutRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(payload) = payload.map_err(rejection_to_http)?;

    state
        .auth
        .logout(&payload.refresh_token)
        .await
        .map_err(service_error_to_http)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Get the caller's identity from a verified access token
#[axum::debug_handler(state = AppState)]
pub async fn me(Extension(user): Extension<AuthenticatedUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.user_id,
        email: user.claims.email,
    })
}
