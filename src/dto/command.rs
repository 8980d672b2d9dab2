use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::score::TeamSide;

/// Body accepted when scheduling a new match.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateMatchRequest {
    /// Client-chosen identifier; generated server-side when absent.
    pub match_id: Option<Uuid>,
}

/// Body accepted when crediting a point.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddPointRequest {
    /// Team the point goes to.
    pub team: TeamSide,
}

/// Body accepted when finishing a match.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct FinishMatchRequest {
    /// Explicit winner, consulted only when the set count is level.
    #[serde(default)]
    pub winner: Option<TeamSide>,
}
