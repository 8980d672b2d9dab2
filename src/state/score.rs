use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Which side of the match a team plays on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    /// Team A.
    A,
    /// Team B.
    B,
}

/// Lifecycle status of a match. Governs which commands are legal and which
/// fields of [`ScoreState`] are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Scheduled but no point has been played; all scores are zero.
    NotStarted,
    /// The match clock is running and points can be scored.
    InProgress,
    /// Play is suspended; the clock is frozen.
    Paused,
    /// Terminal state; the record is read-only from here on.
    Finished,
}

/// Final point tally of one completed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SetSummary {
    /// Points team A held when the set was closed.
    pub team_a_score: u32,
    /// Points team B held when the set was closed.
    pub team_b_score: u32,
}

/// Complete live score of one match.
///
/// Every accepted command produces a fresh `ScoreState` carrying a bumped
/// `revision`, so a snapshot is always self-sufficient: a viewer can render
/// the whole scoreboard from any single delivery and discard anything older
/// than what it already holds.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreState {
    /// Opaque identifier, assigned at creation and never changed.
    pub match_id: Uuid,
    /// Current lifecycle status.
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
    /// Completed sets, oldest first. Always `current_set - 1` entries.
    pub sets_history: Vec<SetSummary>,
    /// Winning side; set exactly once, on the transition into `Finished`.
    pub winner_team: Option<TeamSide>,
    /// Stamped once, when the match leaves `NotStarted`.
    pub started_at: Option<SystemTime>,
    /// Stamped once, when the match enters `Finished`.
    pub finished_at: Option<SystemTime>,
    /// Bumped on every accepted transition.
    pub updated_at: SystemTime,
    /// Monotonic version counter; the persistence gateway refuses to
    /// overwrite a newer revision with an older one.
    pub revision: u64,
    /// Milliseconds of play accumulated across `InProgress` intervals.
    /// Persisted so the elapsed clock survives restarts and reconnects.
    pub active_ms: u64,
    /// Instant the current status began; anchors live clock computation.
    pub status_since: SystemTime,
}

impl ScoreState {
    /// Fresh `NotStarted` record for a newly scheduled match.
    pub fn new(match_id: Uuid, now: SystemTime) -> Self {
        Self {
            match_id,
            status: MatchStatus::NotStarted,
            team_a_score: 0,
            team_b_score: 0,
            team_a_sets: 0,
            team_b_sets: 0,
            current_set: 1,
            sets_history: Vec::new(),
            winner_team: None,
            started_at: None,
            finished_at: None,
            updated_at: now,
            revision: 0,
            active_ms: 0,
            status_since: now,
        }
    }

    /// Side currently leading on points within the set, if any.
    pub fn point_leader(&self) -> Option<TeamSide> {
        match self.team_a_score.cmp(&self.team_b_score) {
            std::cmp::Ordering::Greater => Some(TeamSide::A),
            std::cmp::Ordering::Less => Some(TeamSide::B),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Side currently leading on sets, if any.
    pub fn set_leader(&self) -> Option<TeamSide> {
        match self.team_a_sets.cmp(&self.team_b_sets) {
            std::cmp::Ordering::Greater => Some(TeamSide::A),
            std::cmp::Ordering::Less => Some(TeamSide::B),
            std::cmp::Ordering::Equal => None,
        }
    }
}
