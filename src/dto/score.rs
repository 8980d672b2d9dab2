use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::format_system_time,
    state::{
        clock,
        score::{MatchStatus, ScoreState, SetSummary, TeamSide},
    },
};

/// Snapshot of a match's score as exposed over HTTP and SSE.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct ScoreSnapshot {
    /// Identifier of the match.
    pub match_id: Uuid,
    /// Lifecycle status of the match.
    pub status: MatchStatus,
    /// Points of team A in the current set.
    pub team_a_score: u32,
    /// Points of team B in the current set.
    pub team_b_score: u32,
    /// Sets won by team A.
    pub team_a_sets: u32,
    /// Sets won by team B.
    pub team_b_sets: u32,
    /// One-based index of the set being played.
    pub current_set: u32,
    /// Final scores of every completed set, oldest first.
    pub sets_history: Vec<SetSummary>,
    /// Winner, present once the match is finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_team: Option<TeamSide>,
    /// In-play seconds elapsed; frozen while paused or finished.
    pub elapsed_seconds: u64,
    /// Monotonic revision of the underlying state.
    pub revision: u64,
    /// RFC 3339 timestamp of the first start, absent before it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// RFC 3339 timestamp of the finish, absent before it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    /// RFC 3339 timestamp of the last accepted command.
    pub updated_at: String,
}

impl ScoreSnapshot {
    /// Project a score state into its wire shape, computing the clock at `now`.
    pub fn from_state(state: &ScoreState, now: std::time::SystemTime) -> Self {
        Self {
            match_id: state.match_id,
            status: state.status,
            team_a_score: state.team_a_score,
            team_b_score: state.team_b_score,
            team_a_sets: state.team_a_sets,
            team_b_sets: state.team_b_sets,
            current_set: state.current_set,
            sets_history: state.sets_history.clone(),
            winner_team: state.winner_team,
            elapsed_seconds: clock::elapsed_seconds(state, now),
            revision: state.revision,
            started_at: state.started_at.map(format_system_time),
            finished_at: state.finished_at.map(format_system_time),
            updated_at: format_system_time(state.updated_at),
        }
    }
}

impl From<&ScoreState> for ScoreSnapshot {
    fn from(state: &ScoreState) -> Self {
        Self::from_state(state, std::time::SystemTime::now())
    }
}
