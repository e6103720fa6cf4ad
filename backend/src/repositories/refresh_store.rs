//! Refresh-token store.
//!
//! Maps opaque refresh tokens to user ids with a store-enforced TTL. Redis is
//! the production backend; [`InMemoryRefreshStore`] implements the same
//! contract inside the process for local runs and tests.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Namespace for refresh-token keys in the shared store.
pub const KEY_PREFIX: &str = "refresh:";

/// How often the in-process store sweeps out expired tokens.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh store timed out")]
    Timeout,
    #[error("refresh store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value contract for refresh tokens. Every operation is atomic per key.
#[async_trait]
pub trait RefreshStore: Send + Sync {
    /// Stores `token → user_id`, expiring after `ttl`.
    async fn put(&self, token: &str, user_id: i64, ttl: Duration) -> Result<(), StoreError>;

    /// Returns the owning user id, or [`StoreError::NotFound`] if the token
    /// is unknown, revoked or expired.
    async fn get(&self, token: &str) -> Result<i64, StoreError>;

    /// Revokes `token`. Deleting a missing key succeeds.
    async fn delete(&self, token: &str) -> Result<(), StoreError>;

    /// Connectivity check used at startup.
    async fn ping(&self) -> Result<(), StoreError>;
}

fn key(token: &str) -> String {
    format!("{KEY_PREFIX}{token}")
}

/// Redis-backed refresh store.
#[derive(Clone)]
pub struct RedisRefreshStore {
    connection: ConnectionManager,
}

impl RedisRefreshStore {
    /// Opens a managed, auto-reconnecting connection to `url`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        info!("Connecting to Redis refresh store...");

        let client = Client::open(url).map_err(classify)?;
        let connection = ConnectionManager::new(client).await.map_err(classify)?;

        info!("Redis connection established");
        Ok(Self { connection })
    }
}

#[async_trait]
impl RefreshStore for RedisRefreshStore {
    async fn put(&self, token: &str, user_id: i64, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let _: () = conn
            .pset_ex(key(token), user_id, millis)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<i64, StoreError> {
        let mut conn = self.connection.clone();
        let value: Option<i64> = conn.get(key(token)).await.map_err(classify)?;
        value.ok_or(StoreError::NotFound)
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let _: i64 = conn.del(key(token)).await.map_err(classify)?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(classify)?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!("unexpected PING reply: {pong}")))
        }
    }
}

fn classify(error: RedisError) -> StoreError {
    if error.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Unavailable(error.to_string())
    }
}

/// Expiry used when `now + ttl` would overflow the clock.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
struct Entry {
    user_id: i64,
    expires_at: Instant,
}

/// Process-local refresh store with the same TTL semantics as Redis.
///
/// Not shared between replicas; suitable for a single instance or tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRefreshStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryRefreshStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops expired entries, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        purge(&self.entries).await
    }

    /// Sweeps expired entries every `period` until the last handle to this
    /// store is dropped. `period` must be non-zero.
    pub fn spawn_purger(&self, period: Duration) -> JoinHandle<()> {
        let entries = Arc::downgrade(&self.entries);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(entries) = entries.upgrade() else {
                    break;
                };
                let removed = purge(&entries).await;
                if removed > 0 {
                    debug!(removed, "purged expired refresh tokens");
                }
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

async fn purge(entries: &RwLock<HashMap<String, Entry>>) -> usize {
    let now = Instant::now();
    let mut entries = entries.write().await;
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at > now);
    before - entries.len()
}

#[async_trait]
impl RefreshStore for InMemoryRefreshStore {
    async fn put(&self, token: &str, user_id: i64, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        let entry = Entry {
            user_id,
            expires_at: now.checked_add(ttl).unwrap_or_else(|| now + FAR_FUTURE),
        };
        self.entries.write().await.insert(key(token), entry);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<i64, StoreError> {
        let key = key(token);
        let entry = self.entries.read().await.get(&key).copied();

        match entry {
            Some(entry) if entry.expires_at > Instant::now() => Ok(entry.user_id),
            Some(_) => {
                let mut entries = self.entries.write().await;
                if entries
                    .get(&key)
                    .is_some_and(|entry| entry.expires_at <= Instant::now())
                {
                    entries.remove(&key);
                }
                Err(StoreError::NotFound)
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, token: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(&key(token));
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    #[tokio::test]
    async fn test_put_then_get() {
        let store = InMemoryRefreshStore::new();
        store.put("abc", 42, WEEK).await.unwrap();
        assert_eq!(store.get("abc").await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_unknown_token_not_found() {
        let store = InMemoryRefreshStore::new();
        assert!(matches!(store.get("missing").await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryRefreshStore::new();
        store.put("abc", 1, WEEK).await.unwrap();

        store.delete("abc").await.unwrap();
        store.delete("abc").await.unwrap();
        store.delete("never-existed").await.unwrap();

        assert!(matches!(store.get("abc").await, Err(StoreError::NotFound)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let store = InMemoryRefreshStore::new();
        store.put("abc", 1, Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get("abc").await.unwrap(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(matches!(store.get("abc").await, Err(StoreError::NotFound)));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = InMemoryRefreshStore::new();
        store.put("short", 1, Duration::from_secs(1)).await.unwrap();
        store.put("long", 2, WEEK).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.get("long").await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purger_sweeps_tokens_nobody_reads() {
        let store = InMemoryRefreshStore::new();
        for user_id in 0..1000i64 {
            store
                .put(&format!("tok-{user_id}"), user_id, Duration::from_secs(1))
                .await
                .unwrap();
        }
        let purger = store.spawn_purger(PURGE_INTERVAL);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(store.len().await, 0);

        store.put("fresh", 1, WEEK).await.unwrap();
        assert_eq!(store.len().await, 1);
        purger.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_purger_stops_with_the_store() {
        let store = InMemoryRefreshStore::new();
        let purger = store.spawn_purger(PURGE_INTERVAL);
        drop(store);

        tokio::time::timeout(Duration::from_secs(120), purger)
            .await
            .expect("purger exits once the store is gone")
            .unwrap();
    }

    #[tokio::test]
    async fn test_huge_ttl_does_not_overflow() {
        let store = InMemoryRefreshStore::new();
        store.put("abc", 9, Duration::MAX).await.unwrap();
        assert_eq!(store.get("abc").await.unwrap(), 9);
    }

    #[test]
    fn test_redis_timeouts_classified_separately() {
        let timed_out = RedisError::from(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "read timed out",
        ));
        assert!(matches!(classify(timed_out), StoreError::Timeout));

        let refused = RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(matches!(classify(refused), StoreError::Unavailable(message) if message.contains("refused")));

        let server = RedisError::from((redis::ErrorKind::ResponseError, "WRONGTYPE"));
        assert!(matches!(classify(server), StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_keys_are_namespaced() {
        assert_eq!(key("tok"), "refresh:tok");
    }
}
