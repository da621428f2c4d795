//! CouchDB connection settings.

use std::time::Duration;

use super::error::{CouchDaoError, CouchResult};

/// Database used when `COUCH_DB` is not set.
const DEFAULT_DATABASE: &str = "daily_word_streaks";

/// Connection settings for the CouchDB streak store.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Server URL, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding one document per user.
    pub database: String,
    /// Basic-auth `(user, password)` pair.
    pub credentials: Option<(String, String)>,
    /// Upper bound for every request sent to CouchDB.
    pub request_timeout: Duration,
}

impl CouchConfig {
    /// Settings for `base_url` using the default database and no credentials.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            database: DEFAULT_DATABASE.to_owned(),
            credentials: None,
            request_timeout,
        }
    }

    /// Read `COUCH_BASE_URL` (required), `COUCH_DB`, `COUCH_USERNAME` and `COUCH_PASSWORD`.
    pub fn from_env(request_timeout: Duration) -> CouchResult<Self> {
        let base_url = std::env::var("COUCH_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or(CouchDaoError::MissingEnvVar {
                var: "COUCH_BASE_URL",
            })?;

        let mut config = Self::new(base_url, request_timeout);
        if let Ok(database) = std::env::var("COUCH_DB") {
            config.database = database;
        }
        config.credentials = std::env::var("COUCH_USERNAME")
            .ok()
            .zip(std::env::var("COUCH_PASSWORD").ok());

        Ok(config)
    }
}
