use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

const STORAGE_CONNECTED: &str = "connected";
const STORAGE_UNREACHABLE: &str = "unreachable";
const STORAGE_ABSENT: &str = "absent";

/// Assemble the health payload: probe the score store and report how many
/// matches this process is currently serving. The overall status tracks
/// whether scoring commands would be accepted right now.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let storage = match state.score_store().await {
        None => STORAGE_ABSENT,
        Some(store) => match store.health_check().await {
            Ok(()) => STORAGE_CONNECTED,
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                STORAGE_UNREACHABLE
            }
        },
    };

    let status = if storage == STORAGE_CONNECTED {
        "ok"
    } else {
        "degraded"
    };

    HealthResponse {
        status: status.to_string(),
        storage: storage.to_string(),
        live_matches: state.engine_count(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig, dao::score_store::memory::InMemoryScoreStore, state::AppState,
    };

    #[tokio::test]
    async fn reports_degraded_while_no_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        let health = health_status(&state).await;

        assert_eq!(health.status, "degraded");
        assert_eq!(health.storage, STORAGE_ABSENT);
        assert_eq!(health.live_matches, 0);
    }

    #[tokio::test]
    async fn reports_ok_and_counts_live_matches() {
        let state = AppState::new(AppConfig::default());
        state
            .install_score_store(Arc::new(InMemoryScoreStore::new()))
            .await;
        state.create_engine(Uuid::new_v4()).await.unwrap();
        state.create_engine(Uuid::new_v4()).await.unwrap();

        let health = health_status(&state).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.storage, STORAGE_CONNECTED);
        assert_eq!(health.live_matches, 2);
    }
}
