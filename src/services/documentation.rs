use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Courtside Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::matches::create_match,
        crate::routes::matches::list_matches,
        crate::routes::matches::get_match,
        crate::routes::matches::start_match,
        crate::routes::matches::add_point,
        crate::routes::matches::finish_set,
        crate::routes::matches::finish_match,
        crate::routes::matches::pause_resume,
        crate::routes::stream::score_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::command::CreateMatchRequest,
            crate::dto::command::AddPointRequest,
            crate::dto::command::FinishMatchRequest,
            crate::dto::score::ScoreSnapshot,
            crate::state::score::TeamSide,
            crate::state::score::MatchStatus,
            crate::state::score::SetSummary,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "match", description = "Match scheduling and scoring commands"),
        (name = "stream", description = "Server-sent events score streams"),
    )
)]
pub struct ApiDoc;
