use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for MongoDB operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Errors raised by the MongoDB score store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// The offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The client could not be constructed from the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The initial ping never succeeded.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Number of ping attempts made.
        attempts: u32,
        /// Driver error from the last attempt.
        #[source]
        source: MongoError,
    },
    /// A health-check ping failed on an established connection.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Index creation failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A score write failed.
    #[error("failed to save score for match `{match_id}`")]
    SaveScore {
        /// Match being written.
        match_id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The durable copy is already at an equal or newer revision.
    #[error(
        "stale write for match `{match_id}`: stored revision {stored} >= attempted {attempted}"
    )]
    StaleRevision {
        /// Match being written.
        match_id: Uuid,
        /// Revision found in the collection.
        stored: u64,
        /// Revision the rejected write carried.
        attempted: u64,
    },
    /// A score read failed.
    #[error("failed to load score for match `{match_id}`")]
    LoadScore {
        /// Match being read.
        match_id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The full-collection listing failed.
    #[error("failed to list match scores")]
    ListScores {
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
