//! Tokengate: signup, credential login and an OAuth2-style token endpoint
//! issuing short-lived JWT access tokens and revocable refresh tokens.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod repositories;
pub mod state;
pub mod utils;

use crate::state::AppState;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes::auth_router(state))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}
