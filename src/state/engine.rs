use std::{sync::Arc, time::SystemTime};

use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::{score_store::ScoreStore, storage::StorageError},
    error::ServiceError,
    state::{
        feed::{ScoreFeed, ScoreSubscription},
        score::ScoreState,
        transitions::{ScoreCommand, TieBreakPolicy, transition},
    },
};

/// Authoritative single writer for one match's score.
///
/// All mutation goes through [`apply`](Self::apply), which holds the state
/// lock across validate → persist → commit → publish. Commands for one
/// match are therefore totally ordered, and a snapshot is only broadcast
/// once the durable copy carries it.
#[derive(Debug)]
pub struct MatchScoreEngine {
    match_id: Uuid,
    state: Mutex<ScoreState>,
    feed: ScoreFeed,
    tie_break: TieBreakPolicy,
}

impl MatchScoreEngine {
    /// Wrap an existing score state (fresh or reloaded from storage).
    pub fn new(state: ScoreState, feed_capacity: usize, tie_break: TieBreakPolicy) -> Self {
        Self {
            match_id: state.match_id,
            state: Mutex::new(state),
            feed: ScoreFeed::new(feed_capacity),
            tie_break,
        }
    }

    /// Identifier of the match this engine owns.
    pub fn match_id(&self) -> Uuid {
        self.match_id
    }

    /// Fan-out feed for this match; used by the stream layer to release
    /// subscriptions on viewer disconnect.
    pub fn feed(&self) -> &ScoreFeed {
        &self.feed
    }

    /// Side-effect-free read of the current snapshot.
    pub async fn current(&self) -> ScoreState {
        self.state.lock().await.clone()
    }

    /// Register a viewer. Taken under the state lock so the returned
    /// snapshot is exactly the state any concurrent commit orders around:
    /// the first thing a subscriber sees is `current()` at that instant.
    pub async fn subscribe(&self) -> ScoreSubscription {
        let guard = self.state.lock().await;
        self.feed.subscribe(guard.clone())
    }

    /// Validate and apply a command, persisting before committing.
    ///
    /// On a storage failure the in-memory state is untouched and the caller
    /// is told to retry; nothing is broadcast. On a stale-revision refusal
    /// this engine adopts the durable copy before surfacing the conflict,
    /// since a newer writer evidently owns the match.
    pub async fn apply(
        &self,
        command: ScoreCommand,
        store: &Arc<dyn ScoreStore>,
    ) -> Result<ScoreState, ServiceError> {
        let mut guard = self.state.lock().await;

        let next = transition(&guard, &command, SystemTime::now(), self.tie_break)?;

        match store.save(next.clone().into()).await {
            Ok(()) => {
                *guard = next.clone();
                self.feed.publish(&next);
                debug!(
                    match_id = %self.match_id,
                    revision = next.revision,
                    status = ?next.status,
                    "committed score transition"
                );
                Ok(next)
            }
            Err(StorageError::StaleRevision {
                match_id,
                stored,
                attempted,
            }) => {
                warn!(
                    %match_id,
                    stored,
                    attempted,
                    "stale writer detected; reloading durable state"
                );
                match store.find(self.match_id).await {
                    Ok(Some(entity)) => *guard = entity.into(),
                    Ok(None) => warn!(match_id = %self.match_id, "durable copy vanished during stale-writer reload"),
                    Err(err) => warn!(match_id = %self.match_id, error = %err, "failed to reload after stale write"),
                }
                Err(ServiceError::StaleWriter {
                    match_id,
                    stored,
                    attempted,
                })
            }
            Err(err) => Err(ServiceError::Unavailable(err)),
        }
    }
}
