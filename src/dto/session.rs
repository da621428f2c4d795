//! Bodies of the session endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    dao::models::{Identity, UserProfile},
    services::session_coordinator::{SessionView, StreakOutcome, WordOutcome},
    state::streak::StreakSummary,
};

/// Body of `POST /session`: a device id, a signed-in user, or both (the user wins).
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_identity_present"))]
pub struct SessionStartRequest {
    /// Stable identifier of the visitor's device.
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub device_id: Option<String>,
    /// Signed-in user, when the identity provider reported one.
    #[serde(default)]
    #[validate(nested)]
    pub user: Option<UserPayload>,
}

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    /// Provider-assigned user id.
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    /// Account email.
    #[validate(email)]
    pub email: String,
    /// Name to greet the user with.
    #[serde(default)]
    #[validate(length(max = 100))]
    pub display_name: Option<String>,
}

fn validate_identity_present(request: &SessionStartRequest) -> Result<(), ValidationError> {
    if request.device_id.is_none() && request.user.is_none() {
        let mut err = ValidationError::new("identity_missing");
        err.message = Some("either `deviceId` or `user` must be provided".into());
        return Err(err);
    }
    Ok(())
}

impl SessionStartRequest {
    /// Identity the session runs for.
    pub fn into_identity(self) -> Option<Identity> {
        match (self.user, self.device_id) {
            (Some(user), _) => Some(Identity::User(UserProfile {
                user_id: user.user_id,
                email: user.email,
                display_name: user.display_name,
            })),
            (None, Some(device_id)) => Some(Identity::Device { device_id }),
            (None, None) => None,
        }
    }
}

/// Who the session was computed for.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    /// "device" or "user".
    pub kind: String,
    /// Device id or user id.
    pub id: String,
    /// Account email of a user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name of a user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl From<Identity> for IdentityView {
    fn from(identity: Identity) -> Self {
        match identity {
            Identity::Device { device_id } => Self {
                kind: "device".into(),
                id: device_id,
                email: None,
                display_name: None,
            },
            Identity::User(profile) => Self {
                kind: "user".into(),
                id: profile.user_id,
                email: Some(profile.email),
                display_name: profile.display_name,
            },
        }
    }
}

/// Pair of streak counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreakCounts {
    /// Consecutive days including the latest visit.
    pub current_streak: u32,
    /// Longest streak reached.
    pub best_streak: u32,
}

impl From<StreakSummary> for StreakCounts {
    fn from(summary: StreakSummary) -> Self {
        Self {
            current_streak: summary.current_streak,
            best_streak: summary.best_streak,
        }
    }
}

/// Word flow result, tagged by `status`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WordView {
    /// Word of the day.
    Ready {
        /// The word itself.
        word: String,
        /// Short definition.
        meaning: String,
        /// Sentence using the word.
        example: String,
        /// Pronunciation, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        phonetic: Option<String>,
        /// Grammatical category, when known.
        #[serde(rename = "partOfSpeech", skip_serializing_if = "Option::is_none")]
        part_of_speech: Option<String>,
        /// Pronunciation recording, when known.
        #[serde(rename = "audioUrl", skip_serializing_if = "Option::is_none")]
        audio_url: Option<String>,
    },
    /// Acquisition failed; shown instead of the word, never mistaken for loading.
    Error {
        /// Failure class, e.g. `provider_unavailable`.
        error: String,
        /// Rendered failure.
        details: String,
    },
}

impl From<WordOutcome> for WordView {
    fn from(outcome: WordOutcome) -> Self {
        match outcome {
            WordOutcome::Ready(record) => WordView::Ready {
                word: record.word,
                meaning: record.meaning,
                example: record.example,
                phonetic: record.phonetic,
                part_of_speech: record.part_of_speech,
                audio_url: record.audio_url,
            },
            WordOutcome::Failed { kind, message } => WordView::Error {
                error: kind.to_owned(),
                details: message,
            },
        }
    }
}

/// Streak flow result, tagged by `status`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StreakView {
    /// Counters after this visit.
    Ready {
        /// Consecutive days including this visit.
        #[serde(rename = "currentStreak")]
        current_streak: u32,
        /// Longest streak reached.
        #[serde(rename = "bestStreak")]
        best_streak: u32,
    },
    /// Store unavailable; `retained` carries the counters previously shown.
    Error {
        /// Always `store_unavailable`.
        error: String,
        /// Rendered failure.
        details: String,
        /// Counters last shown for the same identity.
        #[serde(skip_serializing_if = "Option::is_none")]
        retained: Option<StreakCounts>,
    },
}

impl From<StreakOutcome> for StreakView {
    fn from(outcome: StreakOutcome) -> Self {
        match outcome {
            StreakOutcome::Ready(summary) => StreakView::Ready {
                current_streak: summary.current_streak,
                best_streak: summary.best_streak,
            },
            StreakOutcome::Unavailable { message, retained } => StreakView::Error {
                error: "store_unavailable".into(),
                details: message,
                retained: retained.map(StreakCounts::from),
            },
        }
    }
}

/// Body of a successful `POST /session`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Calendar day (`YYYY-MM-DD`, UTC) of the session.
    pub date: String,
    /// Who the session ran for.
    pub identity: IdentityView,
    /// Word flow result.
    pub word: WordView,
    /// Streak flow result.
    pub streak: StreakView,
}

impl From<SessionView> for SessionResponse {
    fn from(view: SessionView) -> Self {
        Self {
            date: view.date.to_string(),
            identity: view.identity.into(),
            word: view.word.into(),
            streak: view.streak.into(),
        }
    }
}
