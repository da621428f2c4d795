//! Business logic called by the routes and background tasks.

/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Session coordination across the word and streak flows.
pub mod session_coordinator;
/// Cloud store connection supervision.
pub mod storage_supervisor;
/// Streak bookkeeping per identity.
pub mod streak_service;
/// Word of the day retrieval.
pub mod word_service;
