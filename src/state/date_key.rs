//! Calendar-day identifiers. Every "day" in the service is a UTC date.

use std::{fmt, str::FromStr, sync::RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, OffsetDateTime, macros::format_description};

/// A calendar day (`YYYY-MM-DD`) keying caches and streak records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(Date);

/// Raised when a string is not a `YYYY-MM-DD` calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date key `{value}`")]
pub struct InvalidDateKey {
    value: String,
}

impl DateKey {
    /// The current UTC calendar day.
    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    /// The following calendar day, `None` only at the end of the supported range.
    pub fn next_day(self) -> Option<Self> {
        self.0.next_day().map(Self)
    }

    /// True iff `current` is exactly one calendar day after `previous`.
    pub fn is_consecutive(previous: Option<DateKey>, current: DateKey) -> bool {
        previous.and_then(DateKey::next_day) == Some(current)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .0
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl FromStr for DateKey {
    type Err = InvalidDateKey;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| InvalidDateKey {
                value: value.to_owned(),
            })
    }
}

impl TryFrom<String> for DateKey {
    type Error = InvalidDateKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DateKey> for String {
    fn from(value: DateKey) -> Self {
        value.to_string()
    }
}

/// Source of "today" so the day policy is applied in exactly one place.
pub trait Clock: Send + Sync {
    /// Current calendar day.
    fn today(&self) -> DateKey;
}

/// Wall clock reading the UTC date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DateKey {
        DateKey::today()
    }
}

/// Clock pinned to a settable day, used by tests and replay tooling.
#[derive(Debug)]
pub struct FixedClock {
    day: RwLock<DateKey>,
}

impl FixedClock {
    /// Pin the clock to `day`.
    pub fn new(day: DateKey) -> Self {
        Self {
            day: RwLock::new(day),
        }
    }

    /// Move the clock to another day.
    pub fn set(&self, day: DateKey) {
        match self.day.write() {
            Ok(mut guard) => *guard = day,
            Err(poisoned) => *poisoned.into_inner() = day,
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> DateKey {
        match self.day.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
