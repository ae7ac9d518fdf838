/// Answer submission and match progression.
pub mod answer_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Flashcard deck listing.
pub mod flashcard_service;
/// Health check service.
pub mod health_service;
/// Match lookups and per-user history.
pub mod match_service;
/// Waiting-pool pairing and match creation.
pub mod matchmaking_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage reconnection supervisor.
pub mod storage_supervisor;
/// User profile upkeep.
pub mod user_service;
