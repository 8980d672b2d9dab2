use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{dao::storage::StorageError, state::transitions::TransitionError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The durable write or read did not complete; the command failed and
    /// the in-memory state was left at the pre-command snapshot.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// The command was not legal from the current score state.
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    /// The durable copy is newer than this engine's view; another writer
    /// exists for the match. The engine reloaded from storage before
    /// surfacing this.
    #[error(
        "stale writer for match `{match_id}`: stored revision {stored} >= attempted {attempted}"
    )]
    StaleWriter {
        /// Match the conflicting write targeted.
        match_id: Uuid,
        /// Revision found in storage.
        stored: u64,
        /// Revision this engine attempted to write.
        attempted: u64,
    },
    /// No match is known under the requested identifier.
    #[error("not found: {0}")]
    NotFound(String),
    /// A match already exists under the requested identifier.
    #[error("already exists: {0}")]
    AlreadyExists(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::StaleRevision {
                match_id,
                stored,
                attempted,
            } => ServiceError::StaleWriter {
                match_id,
                stored,
                attempted,
            },
            unavailable => ServiceError::Unavailable(unavailable),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::Rejected(rejection) => AppError::Conflict(rejection.to_string()),
            stale @ ServiceError::StaleWriter { .. } => AppError::Conflict(stale.to_string()),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::AlreadyExists(message) => AppError::Conflict(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
