//! Word of the day route.

use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::word::TodayWordResponse,
    error::{AppError, ErrorBody},
    services::word_service,
    state::SharedState,
};

/// Routes serving the word of the day.
pub fn router() -> Router<SharedState> {
    Router::new().route("/today-word", get(today_word))
}

/// Word of the day; the same record is returned for every call on a given day.
#[utoipa::path(
    get,
    path = "/today-word",
    tag = "word",
    responses(
        (status = 200, description = "Word of the day", body = TodayWordResponse),
        (status = 500, description = "Word could not be produced", body = ErrorBody)
    )
)]
pub async fn today_word(
    State(state): State<SharedState>,
) -> Result<Json<TodayWordResponse>, AppError> {
    let today = word_service::today_word(&state).await?;
    Ok(Json(today.into()))
}
