//! Defines the HTTP routes for authentication.
//!
//! Signup, login, the OAuth2-style token endpoint, logout, and `/me` as the
//! example route guarded by [`jwt_auth`].

use crate::auth::handlers::*;
use crate::auth::middleware::jwt_auth;
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router(state: AppState) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/oauth/token", post(token))
        .route("/logout", post(logout))
        .route(
            "/me",
            get(me).layer(middleware::from_fn_with_state(state.clone(), jwt_auth)),
        )
        .with_state(state)
}
