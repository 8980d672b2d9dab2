use std::sync::Arc;

use dashmap::{DashMap, Entry};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::ScoreEntity,
    score_store::ScoreStore,
    storage::{StorageError, StorageResult},
};

/// Process-local [`ScoreStore`] used when no external database is
/// configured, and as the persistence double in unit tests.
///
/// The revision guard is enforced atomically through the map's entry API,
/// matching the contract the MongoDB backend implements with a filtered
/// upsert.
#[derive(Clone, Default)]
pub struct InMemoryScoreStore {
    scores: Arc<DashMap<Uuid, ScoreEntity>>,
}

impl InMemoryScoreStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn save_guarded(&self, score: ScoreEntity) -> StorageResult<()> {
        match self.scores.entry(score.match_id) {
            Entry::Occupied(mut slot) => {
                let stored = slot.get().revision;
                if stored >= score.revision {
                    return Err(StorageError::StaleRevision {
                        match_id: score.match_id,
                        stored,
                        attempted: score.revision,
                    });
                }
                slot.insert(score);
            }
            Entry::Vacant(slot) => {
                slot.insert(score);
            }
        }
        Ok(())
    }
}

impl ScoreStore for InMemoryScoreStore {
    fn save(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_guarded(score) })
    }

    fn find(&self, match_id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.scores.get(&match_id).map(|entry| entry.clone())) })
    }

    fn list(&self) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .scores
                .iter()
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::state::score::ScoreState;

    fn entity(match_id: Uuid, revision: u64) -> ScoreEntity {
        let mut state = ScoreState::new(match_id, SystemTime::UNIX_EPOCH);
        state.revision = revision;
        state.into()
    }

    #[tokio::test]
    async fn save_then_find_round_trips() {
        let store = InMemoryScoreStore::new();
        let match_id = Uuid::new_v4();
        let score = entity(match_id, 1);

        store.save(score.clone()).await.unwrap();
        let loaded = store.find(match_id).await.unwrap();
        assert_eq!(loaded, Some(score));
    }

    #[tokio::test]
    async fn find_unknown_match_is_none() {
        let store = InMemoryScoreStore::new();
        assert_eq!(store.find(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn stale_revision_is_rejected() {
        let store = InMemoryScoreStore::new();
        let match_id = Uuid::new_v4();

        store.save(entity(match_id, 3)).await.unwrap();

        // Same revision and older revision are both refused.
        for attempted in [3, 2] {
            let err = store.save(entity(match_id, attempted)).await.unwrap_err();
            match err {
                StorageError::StaleRevision {
                    stored, attempted: got, ..
                } => {
                    assert_eq!(stored, 3);
                    assert_eq!(got, attempted);
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        // A strictly newer revision goes through.
        store.save(entity(match_id, 4)).await.unwrap();
        assert_eq!(store.find(match_id).await.unwrap().unwrap().revision, 4);
    }

    #[tokio::test]
    async fn list_returns_every_match() {
        let store = InMemoryScoreStore::new();
        store.save(entity(Uuid::new_v4(), 1)).await.unwrap();
        store.save(entity(Uuid::new_v4(), 1)).await.unwrap();

        assert_eq!(store.list().await.unwrap().len(), 2);
    }
}
