//! MongoDB document layout of a user streak.

use mongodb::bson::{Document, doc};
use serde::Deserialize;
use serde_with::{DefaultOnError, serde_as};

use crate::state::{date_key::DateKey, streak::StreakState};

/// Streak document stored under the user id, with the same tracked fields as
/// the CouchDB variant.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoStreakDocument {
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    current_streak: u32,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    highest_streak: u32,
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    last_visit: Option<DateKey>,
}

impl From<MongoStreakDocument> for StreakState {
    fn from(value: MongoStreakDocument) -> Self {
        Self {
            last_seen_day: value.last_visit,
            current_streak: value.current_streak,
            best_streak: value.highest_streak,
        }
    }
}

pub fn doc_id(key: &str) -> Document {
    doc! { "_id": key }
}

/// `$set` update overwriting every tracked field at once.
pub fn tracked_fields_update(state: &StreakState, email: Option<&str>) -> Document {
    let mut fields = doc! {
        "currentStreak": i64::from(state.current_streak),
        "highestStreak": i64::from(state.best_streak),
        "lastVisit": state.last_seen_day.map(|day| day.to_string()),
    };
    if let Some(email) = email {
        fields.insert("email", email);
    }
    doc! { "$set": fields }
}
