use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::enrichment::EnrichmentError;
use crate::interview::InterviewError;
use crate::scoring::ScoringError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Caller asked for a transition the current state does not allow.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<InterviewError> for AppError {
    fn from(e: InterviewError) -> Self {
        match e {
            InterviewError::PreconditionFailed(msg) => AppError::PreconditionFailed(msg),
            InterviewError::InvalidAnswer(msg) => AppError::Validation(msg),
            InterviewError::InvariantViolation(msg) => AppError::InvariantViolation(msg),
        }
    }
}

impl From<ScoringError> for AppError {
    fn from(e: ScoringError) -> Self {
        match e {
            ScoringError::PreconditionFailed(msg) => AppError::PreconditionFailed(msg),
        }
    }
}

impl From<EnrichmentError> for AppError {
    fn from(e: EnrichmentError) -> Self {
        match e {
            EnrichmentError::CandidateNotFound(id) => AppError::NotFound(format!("Candidate {id} not found")),
            EnrichmentError::Cancelled(id) => {
                AppError::PreconditionFailed(format!("Enrichment for candidate {id} was cancelled"))
            }
            EnrichmentError::Store(e) => AppError::Store(e),
            EnrichmentError::Transition(msg) => AppError::InvariantViolation(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PreconditionFailed(msg) => (StatusCode::CONFLICT, "PRECONDITION_FAILED", msg.clone()),
            AppError::InvariantViolation(msg) => {
                tracing::error!("Invariant violation: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INVARIANT_VIOLATION",
                    "The operation hit an inconsistent state and was aborted".to_string(),
                )
            }
            AppError::Store(StoreError::Conflict(msg)) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
