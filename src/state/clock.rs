//! Elapsed-time projection derived entirely from [`ScoreState`].
//!
//! The clock holds no state of its own: `active_ms` accumulates play time at
//! every status change and `status_since` anchors the live interval, so any
//! observer computing from the same snapshot converges on the same value,
//! including after a reconnect or a process restart.

use std::time::SystemTime;

use crate::state::{
    score::{MatchStatus, ScoreState},
    transitions::millis_between,
};

/// Milliseconds of play elapsed for `state` as observed at `now`.
///
/// Counts only while the match is `InProgress`; the value is frozen during
/// pauses and permanently once finished.
pub fn elapsed_ms(state: &ScoreState, now: SystemTime) -> u64 {
    match state.status {
        MatchStatus::NotStarted => 0,
        MatchStatus::InProgress => state.active_ms + millis_between(state.status_since, now),
        MatchStatus::Paused | MatchStatus::Finished => state.active_ms,
    }
}

/// Whole seconds of play elapsed, the granularity viewers display.
pub fn elapsed_seconds(state: &ScoreState, now: SystemTime) -> u64 {
    elapsed_ms(state, now) / 1000
}
