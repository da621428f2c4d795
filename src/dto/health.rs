//! Body of the health check endpoint.

use serde::Serialize;
use utoipa::ToSchema;

/// Body of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" while a cloud store is connected, "degraded" otherwise.
    pub status: String,
}

impl HealthResponse {
    /// Cloud store connected.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// Running without a cloud store; device sessions still work.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
        }
    }
}
