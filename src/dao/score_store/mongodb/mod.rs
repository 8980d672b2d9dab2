//! MongoDB backend for the score store (feature `mongo-store`).

mod config;
mod connection;
mod error;
mod models;
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoScoreStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            // Keep the stale-writer signal distinct so the engine can react
            // to it; everything else collapses to an availability failure.
            MongoDaoError::StaleRevision {
                match_id,
                stored,
                attempted,
            } => StorageError::StaleRevision {
                match_id,
                stored,
                attempted,
            },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
