//! Command and query entry points for match scoring.
//!
//! Every scoring command resolves the match's engine and funnels through
//! [`MatchScoreEngine::apply`], so ordering and persistence guarantees live
//! there; this layer only translates between wire shapes and engine calls.

use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dto::score::ScoreSnapshot,
    error::ServiceError,
    state::{
        MatchScoreEngine, ScoreCommand, ScoreState, SharedState,
        score::TeamSide,
    },
};

/// Schedule a new match, generating an identifier when the caller supplied none.
pub async fn create_match(
    state: &SharedState,
    match_id: Option<Uuid>,
) -> Result<ScoreSnapshot, ServiceError> {
    let match_id = match_id.unwrap_or_else(Uuid::new_v4);
    let engine = state.create_engine(match_id).await?;
    Ok(snapshot_of(&engine).await)
}

/// All known matches, straight from the durable store.
pub async fn list_matches(state: &SharedState) -> Result<Vec<ScoreSnapshot>, ServiceError> {
    let store = state.require_score_store().await?;
    let now = SystemTime::now();
    let snapshots = store
        .list()
        .await?
        .into_iter()
        .map(|entity| {
            let score: ScoreState = entity.into();
            ScoreSnapshot::from_state(&score, now)
        })
        .collect();
    Ok(snapshots)
}

/// Current score of one match.
pub async fn get_match(
    state: &SharedState,
    match_id: Uuid,
) -> Result<ScoreSnapshot, ServiceError> {
    let engine = state.engine(match_id).await?;
    Ok(snapshot_of(&engine).await)
}

/// Begin play for a scheduled match.
pub async fn start_match(
    state: &SharedState,
    match_id: Uuid,
) -> Result<ScoreSnapshot, ServiceError> {
    apply(state, match_id, ScoreCommand::Start).await
}

/// Credit one point to `team` in the current set.
pub async fn add_point(
    state: &SharedState,
    match_id: Uuid,
    team: TeamSide,
) -> Result<ScoreSnapshot, ServiceError> {
    apply(state, match_id, ScoreCommand::AddPoint(team)).await
}

/// Close the current set, awarding it to the side leading on points.
pub async fn finish_set(
    state: &SharedState,
    match_id: Uuid,
) -> Result<ScoreSnapshot, ServiceError> {
    apply(state, match_id, ScoreCommand::FinishSet).await
}

/// End the match. `winner` is consulted only when the set count is level.
pub async fn finish_match(
    state: &SharedState,
    match_id: Uuid,
    winner: Option<TeamSide>,
) -> Result<ScoreSnapshot, ServiceError> {
    apply(state, match_id, ScoreCommand::FinishMatch { winner }).await
}

/// Toggle between in-progress and paused, freezing or resuming the clock.
pub async fn pause_resume(
    state: &SharedState,
    match_id: Uuid,
) -> Result<ScoreSnapshot, ServiceError> {
    apply(state, match_id, ScoreCommand::PauseResume).await
}

async fn apply(
    state: &SharedState,
    match_id: Uuid,
    command: ScoreCommand,
) -> Result<ScoreSnapshot, ServiceError> {
    let engine = state.engine(match_id).await?;
    let store = state.require_score_store().await?;
    let committed = engine.apply(command, &store).await?;
    Ok(ScoreSnapshot::from(&committed))
}

async fn snapshot_of(engine: &MatchScoreEngine) -> ScoreSnapshot {
    ScoreSnapshot::from(&engine.current().await)
}
