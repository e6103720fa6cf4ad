//! User directory: the narrow persistence contract the auth service relies on,
//! plus its SQLite implementation.

use crate::database::models::{NewUser, User};
use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("email already registered: {email}")]
    DuplicateEmail { email: String },
    #[error("invalid user record: {0}")]
    Validation(String),
    #[error("user directory timed out")]
    Timeout,
    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}

/// Maps emails to users and enforces email uniqueness.
///
/// Implementations must make `create` atomic: a record is either fully
/// persisted or not at all, and of two concurrent creates for one email
/// exactly one succeeds.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Persists `user` and returns its newly assigned id.
    async fn create(&self, user: NewUser) -> Result<i64, DirectoryError>;

    /// `Ok(None)` when no user has this email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError>;
}

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn create(&self, user: NewUser) -> Result<i64, DirectoryError> {
        user.validate()
            .map_err(|e| DirectoryError::Validation(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, &user.email))?;

        Ok(result.last_insert_rowid())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DirectoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify(e, email))?;

        Ok(user)
    }
}

fn classify(error: sqlx::Error, email: &str) -> DirectoryError {
    match error {
        sqlx::Error::Database(db) if db.is_unique_violation() => DirectoryError::DuplicateEmail {
            email: email.to_string(),
        },
        sqlx::Error::Database(db) if db.is_check_violation() => {
            DirectoryError::Validation(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut => DirectoryError::Timeout,
        other => DirectoryError::Unavailable(other.to_string()),
    }
}
