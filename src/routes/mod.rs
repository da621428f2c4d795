//! HTTP routes of the service.

use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod session;
pub mod word;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(word::router())
        .merge(session::router())
        .merge(docs::router());

    api_router.with_state(state)
}
