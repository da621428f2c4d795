use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for Daily Word Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::word::today_word,
        crate::routes::session::start_session,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::word::TodayWordResponse,
            crate::dto::session::SessionStartRequest,
            crate::dto::session::UserPayload,
            crate::dto::session::SessionResponse,
            crate::dto::session::IdentityView,
            crate::dto::session::WordView,
            crate::dto::session::StreakView,
            crate::dto::session::StreakCounts,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "word", description = "Word of the day"),
        (name = "session", description = "Visitor sessions and streaks"),
    )
)]
pub struct ApiDoc;
