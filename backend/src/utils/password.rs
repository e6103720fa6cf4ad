//! Password hashing and verification backed by bcrypt.
//!
//! bcrypt salts every digest and compares in constant time. Both operations
//! are CPU bound, so the async entry points run them on the blocking pool.

use bcrypt::{hash, verify};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(bcrypt::BcryptError),
    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(bcrypt::BcryptError),
    #[error("Password worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Hashes and verifies user passwords at a fixed bcrypt cost.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    /// Verified against when the user does not exist, so an unknown email
    /// costs as much time as a wrong password.
    decoy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        let decoy_hash = hash("decoy-password", cost).map_err(PasswordError::Hashing)?;
        Ok(Self { cost, decoy_hash })
    }

    /// Produces a salted one-way digest of `secret`.
    pub async fn hash(&self, secret: &str) -> Result<String, PasswordError> {
        let secret = secret.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || hash(secret, cost).map_err(PasswordError::Hashing))
            .await?
    }

    /// Returns `Ok(false)` on mismatch; `Err` only when the digest itself is
    /// unusable.
    pub async fn verify(&self, digest: &str, candidate: &str) -> Result<bool, PasswordError> {
        let digest = digest.to_owned();
        let candidate = candidate.to_owned();
        tokio::task::spawn_blocking(move || {
            verify(candidate, &digest).map_err(PasswordError::MalformedHash)
        })
        .await?
    }

    /// Burns the same work as a real verification and always fails.
    pub async fn verify_decoy(&self, candidate: &str) -> Result<bool, PasswordError> {
        self.verify(&self.decoy_hash, candidate).await?;
        Ok(false)
    }
}
