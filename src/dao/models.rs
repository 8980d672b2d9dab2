use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::score::{MatchStatus, ScoreState, SetSummary, TeamSide};

/// Durable representation of one match's live score, shared across storage
/// backends. Field-for-field mirror of the in-memory [`ScoreState`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreEntity {
    /// Primary key of the match.
    pub match_id: Uuid,
    /// Lifecycle status at the time of the write.
    pub status: MatchStatus,
    /// Team A points within the current set.
    pub team_a_score: u32,
    /// Team B points within the current set.
    pub team_b_score: u32,
    /// Sets won by team A.
    pub team_a_sets: u32,
    /// Sets won by team B.
    pub team_b_sets: u32,
    /// One-based index of the set being played.
    pub current_set: u32,
    /// Completed sets, oldest first.
    pub sets_history: Vec<SetSummary>,
    /// Winning side once the match is finished.
    pub winner_team: Option<TeamSide>,
    /// When the match left the scheduled state.
    pub started_at: Option<SystemTime>,
    /// When the match entered the terminal state.
    pub finished_at: Option<SystemTime>,
    /// Last accepted transition.
    pub updated_at: SystemTime,
    /// Monotonic version; the store refuses writes that do not advance it.
    pub revision: u64,
    /// Accumulated in-play milliseconds for the persistent clock.
    pub active_ms: u64,
    /// When the current status began.
    pub status_since: SystemTime,
}

impl From<ScoreState> for ScoreEntity {
    fn from(value: ScoreState) -> Self {
        Self {
            match_id: value.match_id,
            status: value.status,
            team_a_score: value.team_a_score,
            team_b_score: value.team_b_score,
            team_a_sets: value.team_a_sets,
            team_b_sets: value.team_b_sets,
            current_set: value.current_set,
            sets_history: value.sets_history,
            winner_team: value.winner_team,
            started_at: value.started_at,
            finished_at: value.finished_at,
            updated_at: value.updated_at,
            revision: value.revision,
            active_ms: value.active_ms,
            status_since: value.status_since,
        }
    }
}

impl From<ScoreEntity> for ScoreState {
    fn from(value: ScoreEntity) -> Self {
        Self {
            match_id: value.match_id,
            status: value.status,
            team_a_score: value.team_a_score,
            team_b_score: value.team_b_score,
            team_a_sets: value.team_a_sets,
            team_b_sets: value.team_b_sets,
            current_set: value.current_set,
            sets_history: value.sets_history,
            winner_team: value.winner_team,
            started_at: value.started_at,
            finished_at: value.finished_at,
            updated_at: value.updated_at,
            revision: value.revision,
            active_ms: value.active_ms,
            status_since: value.status_since,
        }
    }
}
