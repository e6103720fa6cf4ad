#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use tokengate::auth::service::AuthService;
use tokengate::config::AuthConfig;
use tokengate::database::Database;
use tokengate::repositories::refresh_store::InMemoryRefreshStore;
use tokengate::repositories::user_repository::UserRepository;
use tokengate::state::AppState;
use tokengate::utils::password::PasswordHasher;

pub const SECRET: &[u8] = b"integration-test-secret-of-at-least-32-bytes";

pub fn auth_config(access_ttl: Duration) -> AuthConfig {
    AuthConfig {
        access_token_ttl: access_ttl,
        refresh_token_ttl: Duration::from_secs(604800),
        signing_secret: SECRET.to_vec(),
        operation_timeout: Duration::from_secs(2),
    }
}

pub struct Harness {
    pub service: AuthService,
    pub store: InMemoryRefreshStore,
    pub db: Database,
}

pub async fn harness_with_ttl(access_ttl: Duration) -> Harness {
    let db = Database::in_memory().await.expect("in-memory database");
    let store = InMemoryRefreshStore::new();
    let service = AuthService::new(
        Arc::new(UserRepository::new(db.pool().clone())),
        Arc::new(store.clone()),
        PasswordHasher::new(4).expect("bcrypt cost"),
        auth_config(access_ttl),
    );

    Harness { service, store, db }
}

pub async fn harness() -> Harness {
    harness_with_ttl(Duration::from_secs(900)).await
}

pub async fn app_state() -> AppState {
    AppState::new(harness().await.service)
}
