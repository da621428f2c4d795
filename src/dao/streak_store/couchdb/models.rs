//! CouchDB document layout of a user streak.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{DefaultOnError, serde_as};

use crate::{
    dao::models::Identity,
    state::{date_key::DateKey, streak::StreakState},
};

pub const STREAK_PREFIX: &str = "streak::";

pub fn streak_doc_id(identity: &Identity) -> String {
    format!("{STREAK_PREFIX}{}", identity.key())
}

/// One user's streak document.
///
/// The tracked fields are `currentStreak`, `highestStreak`, `lastVisit` and
/// `email`; anything else found in the document is carried through untouched.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouchStreakDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub current_streak: u32,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub highest_streak: u32,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub last_visit: Option<DateKey>,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CouchStreakDocument {
    pub fn empty(id: String) -> Self {
        Self {
            id,
            rev: None,
            current_streak: 0,
            highest_streak: 0,
            last_visit: None,
            email: None,
            extra: Map::new(),
        }
    }

    pub fn to_state(&self) -> StreakState {
        StreakState {
            last_seen_day: self.last_visit,
            current_streak: self.current_streak,
            best_streak: self.highest_streak,
        }
    }

    /// Overwrite every tracked field from `state`, keeping the revision and extra fields.
    pub fn apply(&mut self, state: &StreakState, email: Option<&str>) {
        self.current_streak = state.current_streak;
        self.highest_streak = state.best_streak;
        self.last_visit = state.last_seen_day;
        if let Some(email) = email {
            self.email = Some(email.to_owned());
        }
    }
}
