use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        command::{AddPointRequest, CreateMatchRequest, FinishMatchRequest},
        score::ScoreSnapshot,
    },
    error::AppError,
    services::score_service,
    state::SharedState,
};

/// Routes handling match scheduling, reads, and scoring commands.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", post(create_match).get(list_matches))
        .route("/matches/{id}", get(get_match))
        .route("/matches/{id}/start", post(start_match))
        .route("/matches/{id}/points", post(add_point))
        .route("/matches/{id}/sets/finish", post(finish_set))
        .route("/matches/{id}/finish", post(finish_match))
        .route("/matches/{id}/pause-resume", post(pause_resume))
}

/// Schedule a new match in the `not_started` state.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "match",
    request_body = CreateMatchRequest,
    responses(
        (status = 201, description = "Match scheduled", body = ScoreSnapshot),
        (status = 409, description = "A match already exists under the identifier")
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    payload: Option<Json<CreateMatchRequest>>,
) -> Result<(StatusCode, Json<ScoreSnapshot>), AppError> {
    let Json(payload) = payload.unwrap_or_default();
    let snapshot = score_service::create_match(&state, payload.match_id).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// List every known match with its current score.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "match",
    responses(
        (status = 200, description = "All matches", body = [ScoreSnapshot])
    )
)]
pub async fn list_matches(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ScoreSnapshot>>, AppError> {
    let snapshots = score_service::list_matches(&state).await?;
    Ok(Json(snapshots))
}

/// Current score of one match.
#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "match",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Current score", body = ScoreSnapshot),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let snapshot = score_service::get_match(&state, id).await?;
    Ok(Json(snapshot))
}

/// Begin play, starting the match clock.
#[utoipa::path(
    post,
    path = "/matches/{id}/start",
    tag = "match",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Match started", body = ScoreSnapshot),
        (status = 404, description = "Unknown match"),
        (status = 409, description = "Command not legal from the current state")
    )
)]
pub async fn start_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let snapshot = score_service::start_match(&state, id).await?;
    Ok(Json(snapshot))
}

/// Credit one point to a team in the current set.
#[utoipa::path(
    post,
    path = "/matches/{id}/points",
    tag = "match",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    request_body = AddPointRequest,
    responses(
        (status = 200, description = "Point recorded", body = ScoreSnapshot),
        (status = 404, description = "Unknown match"),
        (status = 409, description = "Command not legal from the current state")
    )
)]
pub async fn add_point(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddPointRequest>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let snapshot = score_service::add_point(&state, id, payload.team).await?;
    Ok(Json(snapshot))
}

/// Close the current set, awarding it to the side leading on points.
#[utoipa::path(
    post,
    path = "/matches/{id}/sets/finish",
    tag = "match",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Set closed", body = ScoreSnapshot),
        (status = 404, description = "Unknown match"),
        (status = 409, description = "Set is tied or the command is not legal")
    )
)]
pub async fn finish_set(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let snapshot = score_service::finish_set(&state, id).await?;
    Ok(Json(snapshot))
}

/// End the match and record the winner.
#[utoipa::path(
    post,
    path = "/matches/{id}/finish",
    tag = "match",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    request_body = FinishMatchRequest,
    responses(
        (status = 200, description = "Match finished", body = ScoreSnapshot),
        (status = 404, description = "Unknown match"),
        (status = 409, description = "Winner is ambiguous or the command is not legal")
    )
)]
pub async fn finish_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<FinishMatchRequest>>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let Json(payload) = payload.unwrap_or_default();
    let snapshot = score_service::finish_match(&state, id, payload.winner).await?;
    Ok(Json(snapshot))
}

/// Toggle between in-progress and paused.
#[utoipa::path(
    post,
    path = "/matches/{id}/pause-resume",
    tag = "match",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Clock toggled", body = ScoreSnapshot),
        (status = 404, description = "Unknown match"),
        (status = 409, description = "Command not legal from the current state")
    )
)]
pub async fn pause_resume(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let snapshot = score_service::pause_resume(&state, id).await?;
    Ok(Json(snapshot))
}
