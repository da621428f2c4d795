//! Session start route.

use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::session::{SessionResponse, SessionStartRequest},
    error::{AppError, ErrorBody},
    services::session_coordinator,
    state::SharedState,
};

/// Routes starting visitor sessions.
pub fn router() -> Router<SharedState> {
    Router::new().route("/session", post(start_session))
}

/// Count today's visit and return the word of the day alongside the streak.
///
/// Word and streak fail independently; each carries its own `status`.
#[utoipa::path(
    post,
    path = "/session",
    tag = "session",
    request_body = SessionStartRequest,
    responses(
        (status = 200, description = "Session started", body = SessionResponse),
        (status = 400, description = "Invalid identity", body = ErrorBody)
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SessionStartRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    let identity = payload
        .into_identity()
        .ok_or_else(|| AppError::BadRequest("either `deviceId` or `user` must be provided".into()))?;
    let view = session_coordinator::start_session(&state, identity).await;
    Ok(Json(view.into()))
}
