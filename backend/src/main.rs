//! Main entry point for the tokengate server.
//!
//! Loads configuration, opens the user directory and the refresh-token
//! store, then serves the HTTP API until SIGINT or SIGTERM.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokengate::auth::service::AuthService;
use tokengate::config::Config;
use tokengate::database::Database;
use tokengate::repositories::refresh_store::{
    InMemoryRefreshStore, PURGE_INTERVAL, RedisRefreshStore, RefreshStore,
};
use tokengate::repositories::user_repository::UserRepository;
use tokengate::state::AppState;
use tokengate::utils::password::PasswordHasher;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let db = Database::new(&config).await?;
    db.migrate().await?;

    let refresh_tokens = refresh_store(&config).await?;
    let passwords = PasswordHasher::new(config.bcrypt_cost).context("invalid bcrypt cost")?;

    let auth = AuthService::new(
        Arc::new(UserRepository::new(db.pool().clone())),
        refresh_tokens,
        passwords,
        config.auth(),
    );
    let app = tokengate::app(AppState::new(auth));

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    info!("Starting tokengate server on port {}", config.server_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    Ok(())
}

async fn refresh_store(config: &Config) -> Result<Arc<dyn RefreshStore>> {
    let Some(url) = &config.redis_url else {
        warn!("REDIS_URL not set, refresh tokens are kept in process memory");
        let store = InMemoryRefreshStore::new();
        store.spawn_purger(PURGE_INTERVAL);
        return Ok(Arc::new(store));
    };

    let store = RedisRefreshStore::connect(url)
        .await
        .context("failed to connect to redis")?;
    match store.ping().await {
        Ok(()) => info!("Connected to redis refresh store"),
        Err(e) => warn!(error = %e, "redis ping failed, continuing"),
    }

    Ok(Arc::new(store))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
