//! Persistence gateway for live scores.

pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{models::ScoreEntity, storage::StorageResult};

/// Abstraction over the durable store for match score snapshots.
///
/// `save` is the optimistic stale-writer guard: it must reject any write
/// whose `revision` does not strictly advance the stored copy with
/// [`StorageError::StaleRevision`](crate::dao::storage::StorageError).
pub trait ScoreStore: Send + Sync {
    /// Persist a snapshot, enforcing the revision guard.
    fn save(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch the latest snapshot for a match, if one exists.
    fn find(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>>;
    /// List the latest snapshot of every known match.
    fn list(&self) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    /// Cheap connectivity probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
