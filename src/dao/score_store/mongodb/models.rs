use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dao::models::ScoreEntity,
    state::score::{MatchStatus, SetSummary, TeamSide},
};

/// BSON document shape stored in the scores collection. Timestamps are
/// converted to BSON datetimes so they index and query naturally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    #[serde(rename = "_id")]
    pub(super) id: Uuid,
    pub(super) status: MatchStatus,
    team_a_score: u32,
    team_b_score: u32,
    team_a_sets: u32,
    team_b_sets: u32,
    current_set: u32,
    sets_history: Vec<SetSummary>,
    winner_team: Option<TeamSide>,
    started_at: Option<DateTime>,
    finished_at: Option<DateTime>,
    updated_at: DateTime,
    pub(super) revision: u64,
    active_ms: u64,
    status_since: DateTime,
}

impl From<ScoreEntity> for MongoScoreDocument {
    fn from(value: ScoreEntity) -> Self {
        Self {
            id: value.match_id,
            status: value.status,
            team_a_score: value.team_a_score,
            team_b_score: value.team_b_score,
            team_a_sets: value.team_a_sets,
            team_b_sets: value.team_b_sets,
            current_set: value.current_set,
            sets_history: value.sets_history,
            winner_team: value.winner_team,
            started_at: value.started_at.map(DateTime::from_system_time),
            finished_at: value.finished_at.map(DateTime::from_system_time),
            updated_at: DateTime::from_system_time(value.updated_at),
            revision: value.revision,
            active_ms: value.active_ms,
            status_since: DateTime::from_system_time(value.status_since),
        }
    }
}

impl From<MongoScoreDocument> for ScoreEntity {
    fn from(value: MongoScoreDocument) -> Self {
        Self {
            match_id: value.id,
            status: value.status,
            team_a_score: value.team_a_score,
            team_b_score: value.team_b_score,
            team_a_sets: value.team_a_sets,
            team_b_sets: value.team_b_sets,
            current_set: value.current_set,
            sets_history: value.sets_history,
            winner_team: value.winner_team,
            started_at: value.started_at.map(DateTime::to_system_time),
            finished_at: value.finished_at.map(DateTime::to_system_time),
            updated_at: value.updated_at.to_system_time(),
            revision: value.revision,
            active_ms: value.active_ms,
            status_since: value.status_since.to_system_time(),
        }
    }
}

pub(super) fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub(super) fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
