//! Body of the word of the day endpoint.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{dao::models::WordRecord, state::date_key::DateKey};

/// Word of the day as served by `GET /today-word`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodayWordResponse {
    /// Calendar day (`YYYY-MM-DD`, UTC) the word belongs to.
    pub date: String,
    /// The word itself.
    pub word: String,
    /// Short definition.
    pub meaning: String,
    /// Sentence using the word.
    pub example: String,
    /// Pronunciation, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    /// Grammatical category, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    /// Pronunciation recording, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl From<(DateKey, WordRecord)> for TodayWordResponse {
    fn from((date, record): (DateKey, WordRecord)) -> Self {
        Self {
            date: date.to_string(),
            word: record.word,
            meaning: record.meaning,
            example: record.example,
            phonetic: record.phonetic,
            part_of_speech: record.part_of_speech,
            audio_url: record.audio_url,
        }
    }
}
