//! Shared response envelope and error translation for the HTTP layer.
//!
//! # Response Format
//! Errors return a consistent JSON body:
//! - `success`: always `false`
//! - `message`: human-readable message
//! - `error.error_type`: machine-readable error category
//!
//! Infrastructure failures never leak their internal message to the client.
//! The service layer has already logged them with context.

use crate::errors::ServiceError;
use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message
    pub message: String,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    /// Response timestamp
    pub timestamp: String,
}

/// Error details for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error type identifier
    pub error_type: String,
}

/// Error half of every handler's return type.
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create an error response
    pub fn error(message: impl Into<String>, error_type: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: message.into(),
            error: Some(ErrorDetails {
                error_type: error_type.into(),
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Converts ServiceError to the matching status and error envelope.
pub fn service_error_to_http(error: ServiceError) -> ApiError {
    let (status, error_type, message) = match error {
        ServiceError::Validation { message } => {
            (StatusCode::BAD_REQUEST, "validation_error", message)
        }
        ServiceError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid credentials".to_string(),
        ),
        ServiceError::EmailAlreadyUsed { .. } => (
            StatusCode::CONFLICT,
            "email_already_used",
            "email already used".to_string(),
        ),
        ServiceError::InvalidOrExpiredToken => (
            StatusCode::UNAUTHORIZED,
            "invalid_token",
            "invalid or expired token".to_string(),
        ),
        ServiceError::DirectoryUnavailable { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "directory_unavailable",
            "Service temporarily unavailable".to_string(),
        ),
        ServiceError::StoreUnavailable { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "store_unavailable",
            "Service temporarily unavailable".to_string(),
        ),
        ServiceError::Timeout { .. } => (
            StatusCode::GATEWAY_TIMEOUT,
            "timeout",
            "Upstream timed out".to_string(),
        ),
        ServiceError::RandomSourceExhausted { .. } | ServiceError::InternalError { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error".to_string(),
        ),
    };

    (status, Json(ApiResponse::<()>::error(message, error_type)))
}

/// Reports a body the extractor could not decode (wrong content type,
/// broken syntax, mistyped field) as a validation error.
pub fn rejection_to_http(rejection: impl std::fmt::Display) -> ApiError {
    service_error_to_http(ServiceError::validation(rejection.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: ServiceError) -> (StatusCode, String) {
        let (status, Json(body)) = service_error_to_http(error);
        (status, body.error.unwrap().error_type)
    }

    #[test]
    fn test_domain_error_statuses() {
        assert_eq!(
            status_of(ServiceError::validation("name required")),
            (StatusCode::BAD_REQUEST, "validation_error".to_string())
        );
        assert_eq!(
            status_of(ServiceError::InvalidCredentials),
            (StatusCode::UNAUTHORIZED, "invalid_credentials".to_string())
        );
        assert_eq!(
            status_of(ServiceError::email_already_used("a@x.com")),
            (StatusCode::CONFLICT, "email_already_used".to_string())
        );
        assert_eq!(
            status_of(ServiceError::InvalidOrExpiredToken),
            (StatusCode::UNAUTHORIZED, "invalid_token".to_string())
        );
    }

    #[test]
    fn test_infrastructure_error_statuses() {
        assert_eq!(
            status_of(ServiceError::StoreUnavailable {
                message: "refused".to_string()
            })
            .0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(ServiceError::timeout("refresh store get")).0,
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(ServiceError::RandomSourceExhausted {
                message: "drained".to_string()
            })
            .0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let (_, Json(body)) = service_error_to_http(ServiceError::DirectoryUnavailable {
            message: "disk I/O error at /var/lib/auth.db".to_string(),
        });
        assert!(!body.message.contains("/var/lib"));
        assert!(!body.success);
    }

    #[test]
    fn test_rejection_is_a_validation_error() {
        let (status, Json(body)) = rejection_to_http("Expected request with `Content-Type: application/json`");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.unwrap().error_type, "validation_error");
        assert!(body.message.contains("Content-Type"));
    }
}
