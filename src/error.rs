//! Service and HTTP error types.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::dao::{storage::StorageError, word_source::WordSourceError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The word of the day could not be produced.
    #[error(transparent)]
    Word(#[from] WordSourceError),
    /// Streak store is unavailable.
    #[error(transparent)]
    Store(#[from] StorageError),
    /// No cloud store is installed for authenticated identities.
    #[error("store unavailable: no cloud store connected (degraded mode)")]
    Degraded,
    /// A store call exceeded its timeout.
    #[error("store unavailable: operation timed out")]
    Timeout,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ServiceError {
    /// Stable machine-readable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Word(err) => err.kind(),
            ServiceError::Store(_) | ServiceError::Degraded | ServiceError::Timeout => {
                "store_unavailable"
            }
            ServiceError::InvalidInput(_) => "invalid_input",
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Upstream failure while producing the word of the day.
    #[error("{kind}: {details}")]
    Word {
        /// Failure class.
        kind: &'static str,
        /// Rendered failure.
        details: String,
    },
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Word(source) => AppError::Word {
                kind: source.kind(),
                details: source.to_string(),
            },
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            other => AppError::ServiceUnavailable(other.to_string()),
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Short failure class.
    pub error: String,
    /// Human readable details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "bad_request".into(),
                    details: Some(message),
                },
            ),
            AppError::ServiceUnavailable(message) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: "service_unavailable".into(),
                    details: Some(message),
                },
            ),
            AppError::Word { kind, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: kind.into(),
                    details: Some(details),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[tokio::test]
    async fn word_failures_render_as_500_with_kind_and_details() {
        let err: AppError = ServiceError::from(WordSourceError::NoDefinitionFound { attempts: 10 }).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "no_definition_found");
        assert_eq!(json["details"], "no definition found after 10 attempt(s)");
    }

    #[test]
    fn store_failures_share_one_kind() {
        assert_eq!(ServiceError::Degraded.kind(), "store_unavailable");
        assert_eq!(ServiceError::Timeout.kind(), "store_unavailable");
    }
}
