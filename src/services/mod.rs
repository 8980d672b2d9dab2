/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Match lifecycle and scoring command handling.
pub mod score_service;
/// Score stream fan-out over Server-Sent Events.
pub mod stream_service;
/// Storage reconnection loop and degraded-mode supervision.
pub mod storage_supervisor;
