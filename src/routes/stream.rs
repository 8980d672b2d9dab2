use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, services::stream_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/matches/{id}/stream",
    tag = "stream",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Live score stream", content_type = "text/event-stream", body = String),
        (status = 404, description = "Unknown match")
    )
)]
/// Stream a match's score in realtime: one full snapshot on connect, then
/// one event per committed update.
pub async fn score_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let (engine, subscription) = stream_service::subscribe(&state, id).await?;
    info!(match_id = %id, "new score stream connection");
    Ok(stream_service::to_sse_stream(engine, subscription))
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/matches/{id}/stream", get(score_stream))
}
