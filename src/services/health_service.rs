use tracing::{debug, warn};

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether a cloud store is connected, probing it on the way.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.cloud_streaks().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "cloud store health check failed");
            }
        }
        None => debug!("no cloud store connected (degraded mode)"),
    }

    if state.is_degraded() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
