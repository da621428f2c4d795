use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validated vocabulary item served as the word of the day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WordRecord {
    /// The word itself, never empty.
    pub word: String,
    /// Short definition of the word.
    pub meaning: String,
    /// Sentence using the word.
    pub example: String,
    /// Phonetic transcription, when the provider knows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    /// Part of speech of the sense used for `meaning`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    /// Pronunciation audio, when the provider exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Raised when a provider payload lacks one of the required record fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing or empty field `{0}`")]
pub struct MissingField(pub &'static str);

impl WordRecord {
    /// Build a record from the three required fields, rejecting absent or blank values.
    pub fn validated(
        word: Option<String>,
        meaning: Option<String>,
        example: Option<String>,
    ) -> Result<Self, MissingField> {
        Ok(Self {
            word: required("word", word)?,
            meaning: required("meaning", meaning)?,
            example: required("example", example)?,
            phonetic: None,
            part_of_speech: None,
            audio_url: None,
        })
    }

    /// Attach the optional pronunciation and grammar details, dropping blank values.
    pub fn with_details(
        mut self,
        phonetic: Option<String>,
        part_of_speech: Option<String>,
        audio_url: Option<String>,
    ) -> Self {
        self.phonetic = non_blank(phonetic);
        self.part_of_speech = non_blank(part_of_speech);
        self.audio_url = non_blank(audio_url);
        self
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, MissingField> {
    non_blank(value).ok_or(MissingField(field))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Profile of a signed-in user as reported by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Identifier issued by the identity provider.
    pub user_id: String,
    /// Account email, mirrored into the cloud streak document.
    pub email: String,
    /// Optional human readable name.
    pub display_name: Option<String>,
}

/// Who a session belongs to; streak records are never shared between identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Anonymous visitor identified by a stable per-device id.
    Device {
        /// Identifier generated once per device.
        device_id: String,
    },
    /// Authenticated user whose streak is synced to the cloud store.
    User(UserProfile),
}

impl Identity {
    /// Key the identity's records are stored under.
    pub fn key(&self) -> &str {
        match self {
            Identity::Device { device_id } => device_id,
            Identity::User(profile) => &profile.user_id,
        }
    }

    /// Email attached to the identity, only known for signed-in users.
    pub fn email(&self) -> Option<&str> {
        match self {
            Identity::Device { .. } => None,
            Identity::User(profile) => Some(&profile.email),
        }
    }

    /// Whether the identity came from the authentication provider.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::User(_))
    }

    /// Key that stays unique across both identity kinds.
    pub fn scope_key(&self) -> String {
        match self {
            Identity::Device { device_id } => format!("device:{device_id}"),
            Identity::User(profile) => format!("user:{}", profile.user_id),
        }
    }
}
