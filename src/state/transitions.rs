use std::time::SystemTime;

use serde::Deserialize;
use thiserror::Error;

use crate::state::score::{MatchStatus, ScoreState, SetSummary, TeamSide};

/// Commands a scorekeeper can submit for a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreCommand {
    /// Begin play from the scheduled state.
    Start,
    /// Award one point to the given side.
    AddPoint(TeamSide),
    /// Close the current set in favor of the side leading on points.
    FinishSet,
    /// End the match. `winner` is only consulted when sets are tied.
    FinishMatch {
        /// Explicit winner for a forced finish with equal sets.
        winner: Option<TeamSide>,
    },
    /// Toggle between `InProgress` and `Paused`.
    PauseResume,
}

/// Policy applied when a match is force-finished with equal sets and no
/// explicit winner was supplied with the command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPolicy {
    /// Refuse the finish; the operator must name a winner.
    #[default]
    Reject,
    /// Declare team A the winner.
    FavorTeamA,
    /// Declare team B the winner.
    FavorTeamB,
}

/// Typed rejection returned when a command is not legal from the current
/// state. The state is left untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The command cannot be applied while the match is in this status.
    #[error("invalid transition: {command:?} cannot be applied while {from:?}")]
    InvalidTransition {
        /// Status the match was in when the command arrived.
        from: MatchStatus,
        /// The rejected command.
        command: ScoreCommand,
    },
    /// FinishSet was requested while the set has no leader.
    #[error("set cannot be finished while scores are tied {team_a_score}-{team_b_score}")]
    AmbiguousSetResult {
        /// Team A points at the time of the request.
        team_a_score: u32,
        /// Team B points at the time of the request.
        team_b_score: u32,
    },
    /// FinishMatch was requested with equal sets, no explicit winner, and
    /// the `reject` tie-break policy in force.
    #[error("match cannot be finished with sets tied {team_a_sets}-{team_b_sets}; supply an explicit winner")]
    TiedMatchFinish {
        /// Team A sets at the time of the request.
        team_a_sets: u32,
        /// Team B sets at the time of the request.
        team_b_sets: u32,
    },
}

/// Compute the state that results from applying `command` to `state`.
///
/// Pure: the only wall-clock input is the injected `now`, used to stamp
/// `started_at`/`finished_at`/`updated_at` and to accrue `active_ms` at the
/// status changes that freeze or resume the clock.
pub fn transition(
    state: &ScoreState,
    command: &ScoreCommand,
    now: SystemTime,
    tie_break: TieBreakPolicy,
) -> Result<ScoreState, TransitionError> {
    let mut next = state.clone();

    match (state.status, command) {
        (MatchStatus::NotStarted, ScoreCommand::Start) => {
            next.status = MatchStatus::InProgress;
            next.started_at = Some(now);
            next.status_since = now;
        }
        (MatchStatus::InProgress, ScoreCommand::AddPoint(side)) => match side {
            TeamSide::A => next.team_a_score += 1,
            TeamSide::B => next.team_b_score += 1,
        },
        (MatchStatus::InProgress, ScoreCommand::FinishSet) => {
            let Some(leader) = state.point_leader() else {
                return Err(TransitionError::AmbiguousSetResult {
                    team_a_score: state.team_a_score,
                    team_b_score: state.team_b_score,
                });
            };

            // Summary append, set increment, and score reset are all part
            // of the same snapshot; observers never see an intermediate.
            next.sets_history.push(SetSummary {
                team_a_score: state.team_a_score,
                team_b_score: state.team_b_score,
            });
            match leader {
                TeamSide::A => next.team_a_sets += 1,
                TeamSide::B => next.team_b_sets += 1,
            }
            next.team_a_score = 0;
            next.team_b_score = 0;
            next.current_set += 1;
        }
        (
            MatchStatus::InProgress | MatchStatus::Paused,
            ScoreCommand::FinishMatch { winner },
        ) => {
            let decided = decide_winner(state, *winner, tie_break)?;
            if state.status == MatchStatus::InProgress {
                next.active_ms += millis_between(state.status_since, now);
            }
            next.status = MatchStatus::Finished;
            next.winner_team = Some(decided);
            next.finished_at = Some(now);
            next.status_since = now;
        }
        (MatchStatus::InProgress, ScoreCommand::PauseResume) => {
            next.active_ms += millis_between(state.status_since, now);
            next.status = MatchStatus::Paused;
            next.status_since = now;
        }
        (MatchStatus::Paused, ScoreCommand::PauseResume) => {
            next.status = MatchStatus::InProgress;
            next.status_since = now;
        }
        (from, command) => {
            return Err(TransitionError::InvalidTransition {
                from,
                command: command.clone(),
            });
        }
    }

    next.updated_at = now;
    next.revision = state.revision + 1;
    Ok(next)
}

/// Resolve the winner for a forced finish: the side with strictly more sets
/// wins outright; on equal sets an explicit winner takes precedence, then
/// the configured policy.
fn decide_winner(
    state: &ScoreState,
    explicit: Option<TeamSide>,
    tie_break: TieBreakPolicy,
) -> Result<TeamSide, TransitionError> {
    if let Some(leader) = state.set_leader() {
        return Ok(leader);
    }

    if let Some(side) = explicit {
        return Ok(side);
    }

    match tie_break {
        TieBreakPolicy::Reject => Err(TransitionError::TiedMatchFinish {
            team_a_sets: state.team_a_sets,
            team_b_sets: state.team_b_sets,
        }),
        TieBreakPolicy::FavorTeamA => Ok(TeamSide::A),
        TieBreakPolicy::FavorTeamB => Ok(TeamSide::B),
    }
}

/// Saturating millisecond distance between two instants. A clock stepping
/// backwards yields zero rather than a panic.
pub(crate) fn millis_between(earlier: SystemTime, later: SystemTime) -> u64 {
    later
        .duration_since(earlier)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use uuid::Uuid;

    use super::*;

    fn fresh() -> ScoreState {
        ScoreState::new(Uuid::new_v4(), SystemTime::UNIX_EPOCH)
    }

    fn apply(state: &ScoreState, command: ScoreCommand) -> ScoreState {
        transition(state, &command, SystemTime::UNIX_EPOCH, TieBreakPolicy::default()).unwrap()
    }

    fn reject(state: &ScoreState, command: ScoreCommand) -> TransitionError {
        transition(state, &command, SystemTime::UNIX_EPOCH, TieBreakPolicy::default()).unwrap_err()
    }

    fn add_points(mut state: ScoreState, side: TeamSide, count: u32) -> ScoreState {
        for _ in 0..count {
            state = apply(&state, ScoreCommand::AddPoint(side));
        }
        state
    }

    #[test]
    fn start_moves_to_in_progress_and_stamps_started_at() {
        let state = apply(&fresh(), ScoreCommand::Start);
        assert_eq!(state.status, MatchStatus::InProgress);
        assert_eq!(state.started_at, Some(SystemTime::UNIX_EPOCH));
        assert_eq!(state.revision, 1);
    }

    #[test]
    fn second_start_fails_loudly() {
        let state = apply(&fresh(), ScoreCommand::Start);
        let err = reject(&state, ScoreCommand::Start);
        assert!(matches!(
            err,
            TransitionError::InvalidTransition {
                from: MatchStatus::InProgress,
                ..
            }
        ));
    }

    #[test]
    fn add_point_is_accepted_from_exactly_one_status() {
        let not_started = fresh();
        let in_progress = apply(&not_started, ScoreCommand::Start);
        let paused = apply(&in_progress, ScoreCommand::PauseResume);
        let finished = {
            let leading = add_points(in_progress.clone(), TeamSide::A, 1);
            let leading = apply(&leading, ScoreCommand::FinishSet);
            apply(&leading, ScoreCommand::FinishMatch { winner: None })
        };

        for (state, should_accept) in [
            (&not_started, false),
            (&in_progress, true),
            (&paused, false),
            (&finished, false),
        ] {
            let outcome = transition(
                state,
                &ScoreCommand::AddPoint(TeamSide::A),
                SystemTime::UNIX_EPOCH,
                TieBreakPolicy::default(),
            );
            assert_eq!(outcome.is_ok(), should_accept, "status {:?}", state.status);
        }
    }

    #[test]
    fn tied_finish_set_is_rejected_at_any_magnitude() {
        let started = apply(&fresh(), ScoreCommand::Start);
        for points in [0, 5, 12] {
            let mut tied = add_points(started.clone(), TeamSide::A, points);
            tied = add_points(tied, TeamSide::B, points);
            let err = reject(&tied, ScoreCommand::FinishSet);
            assert_eq!(
                err,
                TransitionError::AmbiguousSetResult {
                    team_a_score: points,
                    team_b_score: points,
                }
            );
        }
    }

    #[test]
    fn sets_history_length_tracks_current_set() {
        let mut state = apply(&fresh(), ScoreCommand::Start);
        for set in 0..4 {
            assert_eq!(state.sets_history.len() as u32, state.current_set - 1);
            state = add_points(state, TeamSide::B, set + 2);
            state = add_points(state, TeamSide::A, 1);
            state = apply(&state, ScoreCommand::FinishSet);
        }
        assert_eq!(state.current_set, 5);
        assert_eq!(state.sets_history.len(), 4);
    }

    #[test]
    fn scenario_a_finish_set_awards_leader_and_resets() {
        let state = apply(&fresh(), ScoreCommand::Start);
        let state = add_points(state, TeamSide::A, 6);
        let state = add_points(state, TeamSide::B, 4);
        let state = apply(&state, ScoreCommand::FinishSet);

        assert_eq!(state.team_a_sets, 1);
        assert_eq!(state.team_b_sets, 0);
        assert_eq!(state.current_set, 2);
        assert_eq!(state.team_a_score, 0);
        assert_eq!(state.team_b_score, 0);
        assert_eq!(
            state.sets_history,
            vec![SetSummary {
                team_a_score: 6,
                team_b_score: 4
            }]
        );
    }

    #[test]
    fn scenario_b_tied_finish_set_leaves_state_unchanged() {
        let state = apply(&fresh(), ScoreCommand::Start);
        let state = add_points(state, TeamSide::A, 3);
        let state = add_points(state, TeamSide::B, 3);

        let err = reject(&state, ScoreCommand::FinishSet);
        assert!(matches!(err, TransitionError::AmbiguousSetResult { .. }));
        assert_eq!(state.team_a_score, 3);
        assert_eq!(state.team_b_score, 3);
        assert_eq!(state.current_set, 1);
    }

    #[test]
    fn scenario_c_points_are_rejected_while_paused() {
        let state = apply(&fresh(), ScoreCommand::Start);
        let paused = apply(&state, ScoreCommand::PauseResume);
        assert_eq!(paused.status, MatchStatus::Paused);

        let err = reject(&paused, ScoreCommand::AddPoint(TeamSide::A));
        assert!(matches!(
            err,
            TransitionError::InvalidTransition {
                from: MatchStatus::Paused,
                ..
            }
        ));

        let resumed = apply(&paused, ScoreCommand::PauseResume);
        let scored = apply(&resumed, ScoreCommand::AddPoint(TeamSide::A));
        assert_eq!(scored.team_a_score, 1);
    }

    #[test]
    fn scenario_d_full_match_for_team_a() {
        let mut state = apply(&fresh(), ScoreCommand::Start);
        for _ in 0..2 {
            state = add_points(state, TeamSide::A, 6);
            state = apply(&state, ScoreCommand::FinishSet);
        }
        state = apply(&state, ScoreCommand::FinishMatch { winner: None });

        assert_eq!(state.status, MatchStatus::Finished);
        assert_eq!(state.winner_team, Some(TeamSide::A));
        assert_eq!(state.sets_history.len(), 2);
        assert!(state.finished_at.is_some());
    }

    #[test]
    fn finish_match_is_allowed_from_paused() {
        let state = apply(&fresh(), ScoreCommand::Start);
        let state = add_points(state, TeamSide::B, 1);
        let state = apply(&state, ScoreCommand::FinishSet);
        let paused = apply(&state, ScoreCommand::PauseResume);

        let finished = apply(&paused, ScoreCommand::FinishMatch { winner: None });
        assert_eq!(finished.winner_team, Some(TeamSide::B));
        assert_eq!(finished.status, MatchStatus::Finished);
    }

    #[test]
    fn tied_forced_finish_follows_the_policy() {
        let tied = apply(&fresh(), ScoreCommand::Start);
        let command = ScoreCommand::FinishMatch { winner: None };

        let err = transition(&tied, &command, SystemTime::UNIX_EPOCH, TieBreakPolicy::Reject)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::TiedMatchFinish {
                team_a_sets: 0,
                team_b_sets: 0,
            }
        );

        let a = transition(&tied, &command, SystemTime::UNIX_EPOCH, TieBreakPolicy::FavorTeamA)
            .unwrap();
        assert_eq!(a.winner_team, Some(TeamSide::A));

        let b = transition(&tied, &command, SystemTime::UNIX_EPOCH, TieBreakPolicy::FavorTeamB)
            .unwrap();
        assert_eq!(b.winner_team, Some(TeamSide::B));
    }

    #[test]
    fn explicit_winner_overrides_the_reject_policy_on_a_tie() {
        let tied = apply(&fresh(), ScoreCommand::Start);
        let finished = apply(
            &tied,
            ScoreCommand::FinishMatch {
                winner: Some(TeamSide::B),
            },
        );
        assert_eq!(finished.winner_team, Some(TeamSide::B));
    }

    #[test]
    fn set_lead_beats_an_explicit_winner_argument() {
        let state = apply(&fresh(), ScoreCommand::Start);
        let state = add_points(state, TeamSide::A, 1);
        let state = apply(&state, ScoreCommand::FinishSet);

        let finished = apply(
            &state,
            ScoreCommand::FinishMatch {
                winner: Some(TeamSide::B),
            },
        );
        assert_eq!(finished.winner_team, Some(TeamSide::A));
    }

    #[test]
    fn terminal_state_rejects_every_command() {
        let state = apply(&fresh(), ScoreCommand::Start);
        let state = add_points(state, TeamSide::A, 1);
        let state = apply(&state, ScoreCommand::FinishSet);
        let finished = apply(&state, ScoreCommand::FinishMatch { winner: None });

        for command in [
            ScoreCommand::Start,
            ScoreCommand::AddPoint(TeamSide::B),
            ScoreCommand::FinishSet,
            ScoreCommand::FinishMatch { winner: None },
            ScoreCommand::PauseResume,
        ] {
            let err = reject(&finished, command);
            assert!(matches!(err, TransitionError::InvalidTransition { .. }));
        }
        assert_eq!(finished.winner_team, Some(TeamSide::A));
    }

    #[test]
    fn pause_accrues_active_time_and_resume_does_not() {
        let t0 = SystemTime::UNIX_EPOCH;
        let t1 = t0 + Duration::from_secs(90);
        let t2 = t1 + Duration::from_secs(60);
        let t3 = t2 + Duration::from_secs(30);

        let state =
            transition(&fresh(), &ScoreCommand::Start, t0, TieBreakPolicy::default()).unwrap();
        let paused =
            transition(&state, &ScoreCommand::PauseResume, t1, TieBreakPolicy::default()).unwrap();
        assert_eq!(paused.active_ms, 90_000);

        let resumed =
            transition(&paused, &ScoreCommand::PauseResume, t2, TieBreakPolicy::default())
                .unwrap();
        assert_eq!(resumed.active_ms, 90_000);

        let finished = transition(
            &resumed,
            &ScoreCommand::FinishMatch {
                winner: Some(TeamSide::A),
            },
            t3,
            TieBreakPolicy::default(),
        )
        .unwrap();
        assert_eq!(finished.active_ms, 120_000);
    }

    #[test]
    fn revision_increments_on_every_accepted_transition() {
        let state = apply(&fresh(), ScoreCommand::Start);
        let state = add_points(state, TeamSide::A, 2);
        assert_eq!(state.revision, 3);

        // A rejection must not consume a revision.
        let _ = reject(&state, ScoreCommand::Start);
        assert_eq!(state.revision, 3);
    }
}
