use std::error::Error;

use thiserror::Error;
use uuid::Uuid;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not complete the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
        /// Backend-specific cause.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The durable copy already carries an equal or newer revision; the
    /// writer attempting this save is stale.
    #[error(
        "stale write for match `{match_id}`: stored revision {stored} >= attempted {attempted}"
    )]
    StaleRevision {
        /// Match whose record was contended.
        match_id: Uuid,
        /// Revision currently stored.
        stored: u64,
        /// Revision the rejected write carried.
        attempted: u64,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
