use serde::Serialize;
use utoipa::ToSchema;

/// Health snapshot returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct HealthResponse {
    /// Overall status: "ok" when commands are accepted, "degraded" when
    /// scoring commands are refused for lack of a healthy store.
    pub status: String,
    /// Storage backend: "connected", "unreachable", or "absent".
    pub storage: String,
    /// Matches with a live engine in this process.
    pub live_matches: usize,
}
