//! Application-level configuration loading: word source strategy, timeouts and local storage.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::dao::word_source::GenerativeVendor;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "DAILY_WORD_BACK_CONFIG_PATH";

const DEFAULT_WORD_LIST_URL: &str = "https://random-word-api.herokuapp.com/word?number=1";
const DEFAULT_DICTIONARY_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en/";
const DEFAULT_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_API_KEY_ENV: &str = "AI_API_KEY";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 8_000;
const DEFAULT_WORD_DEADLINE_MS: u64 = 15_000;
const DEFAULT_DATA_DIR: &str = "data";

/// How the word of the day is produced.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum WordSourceConfig {
    /// One chat-completions call per cache miss.
    Generative {
        /// Preset supplying the default endpoint and model.
        #[serde(default)]
        vendor: GenerativeVendor,
        /// Endpoint overriding the vendor's.
        #[serde(default)]
        endpoint: Option<String>,
        /// Model overriding the vendor's.
        #[serde(default)]
        model: Option<String>,
        /// Environment variable holding the API key.
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
    },
    /// Random word drawn from a list, then looked up in a dictionary.
    Lookup {
        /// Where candidates are drawn from.
        #[serde(default)]
        word_list: WordListConfig,
        /// Base URL the candidate word is appended to.
        #[serde(default = "default_dictionary_url")]
        dictionary_url: String,
        /// Candidates tried before giving up.
        #[serde(default = "default_max_attempts")]
        max_attempts: u32,
    },
}

impl Default for WordSourceConfig {
    fn default() -> Self {
        WordSourceConfig::Lookup {
            word_list: WordListConfig::default(),
            dictionary_url: default_dictionary_url(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Where lookup candidates come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WordListConfig {
    /// Remote endpoint answering a JSON array of words.
    Http {
        /// Endpoint URL.
        url: String,
    },
    /// Words listed in the configuration itself.
    Static {
        /// Candidate words.
        words: Vec<String>,
    },
}

impl Default for WordListConfig {
    fn default() -> Self {
        WordListConfig::Http {
            url: DEFAULT_WORD_LIST_URL.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Selected word source strategy.
    pub word_source: WordSourceConfig,
    /// Upper bound for every provider and store call.
    pub request_timeout: Duration,
    /// Time a session waits for the word of the day before reporting it failed.
    pub word_deadline: Duration,
    /// Directory of the device-local store.
    pub data_dir: PathBuf,
    /// Mirror the daily cache into the local store so restarts keep the day's word.
    pub persist_daily_word: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        strategy = app_config.strategy_name(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document; absent keys take their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }

    fn strategy_name(&self) -> &'static str {
        match self.word_source {
            WordSourceConfig::Generative { .. } => "generative",
            WordSourceConfig::Lookup { .. } => "lookup",
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    word_source: WordSourceConfig,
    request_timeout_ms: u64,
    word_deadline_ms: u64,
    data_dir: String,
    persist_daily_word: bool,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            word_source: WordSourceConfig::default(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            word_deadline_ms: DEFAULT_WORD_DEADLINE_MS,
            data_dir: DEFAULT_DATA_DIR.to_owned(),
            persist_daily_word: true,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            word_source: value.word_source,
            request_timeout: Duration::from_millis(value.request_timeout_ms.max(1)),
            word_deadline: Duration::from_millis(value.word_deadline_ms.max(1)),
            data_dir: PathBuf::from(value.data_dir),
            persist_daily_word: value.persist_daily_word,
        }
    }
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_owned()
}

fn default_dictionary_url() -> String {
    DEFAULT_DICTIONARY_URL.to_owned()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_lookup_defaults() {
        let config = AppConfig::from_json("{}").unwrap();

        assert_eq!(config.word_source, WordSourceConfig::default());
        assert_eq!(config.request_timeout, Duration::from_secs(8));
        assert_eq!(config.word_deadline, Duration::from_secs(15));
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(config.persist_daily_word);
    }

    #[test]
    fn generative_strategy_with_vendor() {
        let config = AppConfig::from_json(
            r#"{
                "wordSource": { "strategy": "generative", "vendor": "openai", "model": "gpt-4o" },
                "requestTimeoutMs": 2500,
                "wordDeadlineMs": 4000
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.word_source,
            WordSourceConfig::Generative {
                vendor: GenerativeVendor::OpenAi,
                endpoint: None,
                model: Some("gpt-4o".into()),
                api_key_env: "AI_API_KEY".into(),
            }
        );
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.word_deadline, Duration::from_millis(4000));
    }

    #[test]
    fn lookup_strategy_with_static_word_list() {
        let config = AppConfig::from_json(
            r#"{
                "wordSource": {
                    "strategy": "lookup",
                    "wordList": { "kind": "static", "words": ["ephemeral", "lucid"] },
                    "maxAttempts": 3
                },
                "persistDailyWord": false
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.word_source,
            WordSourceConfig::Lookup {
                word_list: WordListConfig::Static {
                    words: vec!["ephemeral".into(), "lucid".into()],
                },
                dictionary_url: DEFAULT_DICTIONARY_URL.into(),
                max_attempts: 3,
            }
        );
        assert!(!config.persist_daily_word);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert!(AppConfig::from_json(r#"{ "wordSource": { "strategy": "oracle" } }"#).is_err());
    }
}
