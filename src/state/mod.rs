//! Shared application state: the per-match engine registry, the installed
//! storage backend, and the degraded-mode flag.

pub mod clock;
pub mod engine;
pub mod feed;
pub mod score;
pub mod transitions;

use std::{sync::Arc, time::SystemTime};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tracing::info;
use uuid::Uuid;

use crate::{config::AppConfig, dao::score_store::ScoreStore, error::ServiceError};

pub use self::engine::MatchScoreEngine;
pub use self::feed::{ScoreFeed, ScoreSubscription};
pub use self::score::{MatchStatus, ScoreState, SetSummary, TeamSide};
pub use self::transitions::{ScoreCommand, TieBreakPolicy, TransitionError};

/// Shared handle to [`AppState`].
pub type SharedState = Arc<AppState>;

/// Central application state. Engines are created lazily, one per match,
/// and matches never share mutable state with each other.
pub struct AppState {
    score_store: RwLock<Option<Arc<dyn ScoreStore>>>,
    engines: DashMap<Uuid, Arc<MatchScoreEngine>>,
    /// Serializes engine construction so a cold start never races another
    /// cold start into two writers for the same match.
    engine_gate: Mutex<()>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be
    /// cloned cheaply. The application starts in degraded mode until a
    /// storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            score_store: RwLock::new(None),
            engines: DashMap::new(),
            engine_gate: Mutex::new(()),
            degraded: degraded_tx,
            config,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current score store, if one is installed.
    pub async fn score_store(&self) -> Option<Arc<dyn ScoreStore>> {
        let guard = self.score_store.read().await;
        guard.as_ref().cloned()
    }

    /// Score store handle, or [`ServiceError::Degraded`] when none is
    /// installed. Commands cannot be accepted without durable storage.
    pub async fn require_score_store(&self) -> Result<Arc<dyn ScoreStore>, ServiceError> {
        self.score_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new score store implementation and leave degraded mode.
    pub async fn install_score_store(&self, store: Arc<dyn ScoreStore>) {
        {
            let mut guard = self.score_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current score store and enter degraded mode.
    pub async fn clear_score_store(&self) {
        {
            let mut guard = self.score_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.score_store.read().await;
        guard.is_none()
    }

    /// Number of matches with a live engine in this process.
    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Engine for an existing match, constructing it from the durable copy
    /// on first access (cold start after a restart).
    pub async fn engine(&self, match_id: Uuid) -> Result<Arc<MatchScoreEngine>, ServiceError> {
        if let Some(engine) = self.engines.get(&match_id) {
            return Ok(engine.clone());
        }

        let _gate = self.engine_gate.lock().await;
        // Re-check: another caller may have built it while we waited.
        if let Some(engine) = self.engines.get(&match_id) {
            return Ok(engine.clone());
        }

        let store = self.require_score_store().await?;
        let Some(entity) = store.find(match_id).await? else {
            return Err(ServiceError::NotFound(format!(
                "match `{match_id}` not found"
            )));
        };

        info!(%match_id, "reloaded match engine from storage");
        let engine = self.build_engine(entity.into());
        self.engines.insert(match_id, engine.clone());
        Ok(engine)
    }

    /// Create the engine for a newly scheduled match, persisting its fresh
    /// `NotStarted` record. Fails when the identifier is already taken,
    /// in memory or in storage.
    pub async fn create_engine(
        &self,
        match_id: Uuid,
    ) -> Result<Arc<MatchScoreEngine>, ServiceError> {
        let _gate = self.engine_gate.lock().await;

        if self.engines.contains_key(&match_id) {
            return Err(ServiceError::AlreadyExists(format!(
                "match `{match_id}` already exists"
            )));
        }

        let store = self.require_score_store().await?;
        if store.find(match_id).await?.is_some() {
            return Err(ServiceError::AlreadyExists(format!(
                "match `{match_id}` already exists"
            )));
        }

        let state = ScoreState::new(match_id, SystemTime::now());
        store.save(state.clone().into()).await?;

        info!(%match_id, "scheduled new match");
        let engine = self.build_engine(state);
        self.engines.insert(match_id, engine.clone());
        Ok(engine)
    }

    fn build_engine(&self, state: ScoreState) -> Arc<MatchScoreEngine> {
        Arc::new(MatchScoreEngine::new(
            state,
            self.config.feed_capacity(),
            self.config.tie_break(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::score_store::memory::InMemoryScoreStore;

    async fn state_with_memory_store() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .install_score_store(Arc::new(InMemoryScoreStore::new()))
            .await;
        state
    }

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.engine(Uuid::new_v4()).await.unwrap_err(),
            ServiceError::Degraded
        ));

        state
            .install_score_store(Arc::new(InMemoryScoreStore::new()))
            .await;
        assert!(!state.is_degraded().await);
    }

    #[tokio::test]
    async fn create_then_fetch_returns_the_same_engine() {
        let state = state_with_memory_store().await;
        let match_id = Uuid::new_v4();

        let created = state.create_engine(match_id).await.unwrap();
        let fetched = state.engine(match_id).await.unwrap();
        assert!(Arc::ptr_eq(&created, &fetched));
    }

    #[tokio::test]
    async fn duplicate_creation_is_refused() {
        let state = state_with_memory_store().await;
        let match_id = Uuid::new_v4();

        state.create_engine(match_id).await.unwrap();
        let err = state.create_engine(match_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn unknown_match_is_not_found() {
        let state = state_with_memory_store().await;
        let err = state.engine(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn cold_start_reloads_from_the_durable_copy() {
        let store = Arc::new(InMemoryScoreStore::new());
        let match_id = Uuid::new_v4();

        // First process schedules the match and plays a command.
        let first = AppState::new(AppConfig::default());
        first.install_score_store(store.clone()).await;
        let engine = first.create_engine(match_id).await.unwrap();
        let committed = {
            let handle = first.require_score_store().await.unwrap();
            engine.apply(ScoreCommand::Start, &handle).await.unwrap()
        };

        // Second process (fresh AppState, same store) resumes the match.
        let second = AppState::new(AppConfig::default());
        second.install_score_store(store).await;
        let revived = second.engine(match_id).await.unwrap();
        assert_eq!(revived.current().await, committed);
    }
}
