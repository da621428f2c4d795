//! Streak counters and the day-to-day transition.

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnError, serde_as};

use crate::state::date_key::DateKey;

/// Persisted streak counters for one identity.
///
/// Stored records are decoded leniently: an unreadable field falls back to its
/// default rather than failing the whole record, and [`transition`] repairs
/// whatever invariant the stored values broke.
#[serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    /// Last day a visit was counted.
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub last_seen_day: Option<DateKey>,
    /// Consecutive days ending at `last_seen_day`.
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub current_streak: u32,
    /// Longest streak ever reached.
    #[serde_as(deserialize_as = "DefaultOnError")]
    #[serde(default)]
    pub best_streak: u32,
}

/// The pair of counters shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    /// Current consecutive-day streak.
    pub current_streak: u32,
    /// Best streak ever reached.
    pub best_streak: u32,
}

impl StreakState {
    /// Counters to display for this state.
    pub fn summary(&self) -> StreakSummary {
        StreakSummary {
            current_streak: self.current_streak,
            best_streak: self.best_streak,
        }
    }
}

/// Count a visit on `today`.
///
/// Same-day visits leave the counters alone, a visit the day after the last one
/// extends the streak and anything else starts over at one. Afterwards
/// `best_streak >= current_streak >= 1` and `last_seen_day == today`.
pub fn transition(state: StreakState, today: DateKey) -> StreakState {
    let current_streak = if state.last_seen_day == Some(today) {
        state.current_streak.max(1)
    } else if DateKey::is_consecutive(state.last_seen_day, today) {
        state.current_streak.saturating_add(1)
    } else {
        1
    };

    StreakState {
        last_seen_day: Some(today),
        current_streak,
        best_streak: state.best_streak.max(current_streak),
    }
}
