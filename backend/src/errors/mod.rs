//! Global application error types.
//!
//! Each layer owns a narrow error enum (`DirectoryError`, `StoreError`,
//! `JwtError`, `PasswordError`, `RandomError`); all of them fold into
//! [`ServiceError`], which is what the orchestrator returns and what the HTTP
//! layer translates into a status code.

use crate::repositories::refresh_store::StoreError;
use crate::repositories::user_repository::DirectoryError;
use crate::utils::jwt::JwtError;
use crate::utils::password::PasswordError;
use crate::utils::refresh_token::RandomError;
use thiserror::Error;

/// Errors surfaced by the auth orchestrator.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Wrong email or wrong password. Deliberately does not say which.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already used: {email}")]
    EmailAlreadyUsed { email: String },

    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("User directory unavailable: {message}")]
    DirectoryUnavailable { message: String },

    #[error("Refresh store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Timed out waiting for {operation}")]
    Timeout { operation: String },

    #[error("Random source exhausted: {message}")]
    RandomSourceExhausted { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn email_already_used(email: impl Into<String>) -> Self {
        Self::EmailAlreadyUsed {
            email: email.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Infrastructure failures, as opposed to caller-correctable domain errors.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::DirectoryUnavailable { .. }
                | Self::StoreUnavailable { .. }
                | Self::Timeout { .. }
                | Self::RandomSourceExhausted { .. }
                | Self::InternalError { .. }
        )
    }
}

impl From<DirectoryError> for ServiceError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::DuplicateEmail { email } => Self::EmailAlreadyUsed { email },
            DirectoryError::Validation(message) => Self::Validation { message },
            DirectoryError::Timeout => Self::timeout("user directory"),
            DirectoryError::Unavailable(message) => Self::DirectoryUnavailable { message },
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::InvalidOrExpiredToken,
            StoreError::Timeout => Self::timeout("refresh store"),
            StoreError::Unavailable(message) => Self::StoreUnavailable { message },
        }
    }
}

impl From<JwtError> for ServiceError {
    fn from(error: JwtError) -> Self {
        match error {
            JwtError::Encoding(source) => {
                Self::internal_error(format!("Token generation failed: {source}"))
            }
            JwtError::Expired | JwtError::Invalid => Self::InvalidOrExpiredToken,
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(error: PasswordError) -> Self {
        Self::internal_error(error.to_string())
    }
}

impl From<RandomError> for ServiceError {
    fn from(error: RandomError) -> Self {
        Self::RandomSourceExhausted {
            message: error.to_string(),
        }
    }
}
