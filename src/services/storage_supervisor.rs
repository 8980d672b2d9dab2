//! Keeps the score store attached, refusing commands while it is gone.
//!
//! Losing storage must not kill live scoreboards: engines and their feeds
//! keep serving the last committed snapshots while the store slot is empty,
//! and every scoring command is refused until the backend is back. The
//! supervisor owns that slot: it installs the store once a connection
//! holds, probes its health, and clears the slot the moment a probe fails.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{score_store::ScoreStore, storage::StorageError},
    state::SharedState,
};

/// First retry delay after a failed connect or reconnect.
const BACKOFF_FLOOR: Duration = Duration::from_secs(1);
/// Retry delays double up to this ceiling.
const BACKOFF_CEILING: Duration = Duration::from_secs(10);
/// Spacing of health probes against an attached backend.
const PROBE_INTERVAL: Duration = Duration::from_secs(5);
/// Reattach attempts before a connection is written off entirely.
const REATTACH_ATTEMPTS: u32 = 3;

/// Drive the storage lifecycle forever: connect, watch, reattach, repeat.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn ScoreStore>, StorageError>> + Send,
{
    let mut backoff = BACKOFF_FLOOR;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_score_store(store.clone()).await;
                info!("score store attached; accepting commands");
                backoff = BACKOFF_FLOOR;

                watch_health(&state, &store).await;
                warn!("score store lost; feeds stay live, commands are refused");
            }
            Err(err) => {
                warn!(error = %err, retry_in = ?backoff, "score store connection failed");
            }
        }

        sleep(backoff).await;
        backoff = (backoff * 2).min(BACKOFF_CEILING);
    }
}

/// Probe the attached store, detaching it whenever a probe fails so
/// commands are refused during reattachment. Returns once the backend is
/// considered gone for good.
async fn watch_health(state: &SharedState, store: &Arc<dyn ScoreStore>) {
    loop {
        if store.health_check().await.is_ok() {
            sleep(PROBE_INTERVAL).await;
            continue;
        }

        warn!("score store health probe failed; refusing commands");
        state.clear_score_store().await;

        if !reattach(store.as_ref()).await {
            return;
        }

        state.install_score_store(store.clone()).await;
        info!("score store reattached; accepting commands");
        sleep(PROBE_INTERVAL).await;
    }
}

/// Bounded reconnect attempts against the same backend.
async fn reattach(store: &dyn ScoreStore) -> bool {
    let mut backoff = BACKOFF_FLOOR;

    for attempt in 1..=REATTACH_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => return true,
            Err(err) => {
                warn!(attempt, error = %err, "score store reconnect failed");
                sleep(backoff).await;
                backoff = (backoff * 2).min(BACKOFF_CEILING);
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use futures::future::BoxFuture;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::ScoreEntity, score_store::memory::InMemoryScoreStore,
            storage::StorageResult,
        },
        state::AppState,
    };

    /// Backend whose probes and reconnects always fail.
    struct WedgedStore;

    impl ScoreStore for WedgedStore {
        fn save(&self, _score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async {
                Err(StorageError::unavailable(
                    "backend wedged".into(),
                    std::io::Error::other("backend wedged"),
                ))
            })
        }

        fn find(&self, _match_id: Uuid) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
            Box::pin(async { Ok(None) })
        }

        fn list(&self) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async {
                Err(StorageError::unavailable(
                    "probe failed".into(),
                    std::io::Error::other("probe failed"),
                ))
            })
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async {
                Err(StorageError::unavailable(
                    "reconnect failed".into(),
                    std::io::Error::other("reconnect failed"),
                ))
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_backend_leaves_degraded_mode_and_stays_there() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);

        let supervisor = tokio::spawn(run(state.clone(), || async {
            Ok(Arc::new(InMemoryScoreStore::new()) as Arc<dyn ScoreStore>)
        }));

        for _ in 0..50 {
            sleep(Duration::from_millis(100)).await;
            if !state.is_degraded().await {
                break;
            }
        }
        assert!(!state.is_degraded().await);

        // Several probe intervals later the store is still attached.
        sleep(Duration::from_secs(30)).await;
        assert!(!state.is_degraded().await);
        supervisor.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn connect_failures_are_retried_until_the_backend_accepts() {
        let state = AppState::new(AppConfig::default());
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        let supervisor = tokio::spawn(run(state.clone(), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StorageError::unavailable(
                        "backend offline".into(),
                        std::io::Error::other("backend offline"),
                    ))
                } else {
                    Ok(Arc::new(InMemoryScoreStore::new()) as Arc<dyn ScoreStore>)
                }
            }
        }));

        for _ in 0..100 {
            sleep(Duration::from_secs(1)).await;
            if !state.is_degraded().await {
                break;
            }
        }
        assert!(!state.is_degraded().await);
        assert!(attempts.load(Ordering::SeqCst) >= 3);
        supervisor.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn dead_backend_flips_the_state_back_to_degraded() {
        let state = AppState::new(AppConfig::default());
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        // First connect hands out a wedged backend; later attempts fail, so
        // once the store is dropped the state stays degraded.
        let supervisor = tokio::spawn(run(state.clone(), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(Arc::new(WedgedStore) as Arc<dyn ScoreStore>)
                } else {
                    Err(StorageError::unavailable(
                        "backend offline".into(),
                        std::io::Error::other("backend offline"),
                    ))
                }
            }
        }));

        for _ in 0..300 {
            sleep(Duration::from_secs(1)).await;
            if state.is_degraded().await && attempts.load(Ordering::SeqCst) >= 2 {
                break;
            }
        }
        assert!(state.is_degraded().await);
        supervisor.abort();
    }
}
