//! Service error taxonomy.
//!
//! Every fallible domain operation returns one of these variants so that
//! callers can match exhaustively instead of duck-typing on error payloads.
//! The HTTP layer maps variants onto status codes in one place.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Closed error type for all domain operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Structural or business-rule violations on input. All violations found
    /// are collected before returning, never just the first one.
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A language or translation record that should exist does not.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate language code or a pre-existing identical translation.
    #[error("{0}")]
    Conflict(String),

    /// A disallowed mutation: deleting the default language, a language with
    /// translations, or a heavily-used approved translation; re-approving.
    #[error("{0}")]
    BusinessRule(String),

    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// The external translate backend failed.
    #[error("translate backend error: {0}")]
    Backend(#[source] anyhow::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Status code this error maps to on the HTTP surface.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::BusinessRule(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Storage(_) | ServiceError::Backend(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal details stay in the logs, not in the response body.
        let message = match &self {
            ServiceError::Storage(e) => {
                tracing::error!("storage error: {e}");
                "internal storage error".to_string()
            }
            ServiceError::Backend(e) => {
                tracing::error!("translate backend error: {e:#}");
                "translate backend unavailable".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
