//! Providers of the word of the day.

mod dictionary;
mod generative;
mod lookup;
mod word_list;

use std::{fmt::Display, sync::Arc};

use futures::future::BoxFuture;
use reqwest::Client;
use thiserror::Error;

use crate::{
    config::{WordListConfig, WordSourceConfig},
    dao::models::WordRecord,
};

pub use dictionary::{DictionaryEntry, DictionaryProvider, HttpDictionary};
pub use generative::{GenerativeVendor, GenerativeWordSource};
pub use lookup::LookupWordSource;
pub use word_list::{HttpWordList, StaticWordList, WordListProvider};

/// Result alias for word acquisition.
pub type WordSourceResult<T> = Result<T, WordSourceError>;

/// Failures surfaced by a word source.
///
/// Errors carry rendered messages instead of their sources so a single
/// acquisition outcome can be handed to every request waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordSourceError {
    /// Network, auth, status, timeout or configuration failure.
    #[error("{provider} unavailable: {message}")]
    ProviderUnavailable {
        /// Provider that failed.
        provider: &'static str,
        /// Rendered failure description.
        message: String,
    },
    /// The provider answered with something that is not a usable word record.
    #[error("{provider} returned invalid content: {message}")]
    InvalidContent {
        /// Provider that answered.
        provider: &'static str,
        /// What was wrong with the payload.
        message: String,
    },
    /// Every candidate drawn by the lookup strategy lacked a usable definition.
    #[error("no definition found after {attempts} attempt(s)")]
    NoDefinitionFound {
        /// Candidates tried before giving up.
        attempts: u32,
    },
}

impl WordSourceError {
    /// Provider failure built from any displayable error.
    pub fn unavailable(provider: &'static str, err: impl Display) -> Self {
        WordSourceError::ProviderUnavailable {
            provider,
            message: err.to_string(),
        }
    }

    /// Content failure built from any displayable error.
    pub fn invalid(provider: &'static str, err: impl Display) -> Self {
        WordSourceError::InvalidContent {
            provider,
            message: err.to_string(),
        }
    }

    /// Stable machine-readable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            WordSourceError::ProviderUnavailable { .. } => "provider_unavailable",
            WordSourceError::InvalidContent { .. } => "invalid_content",
            WordSourceError::NoDefinitionFound { .. } => "no_definition_found",
        }
    }
}

/// Produces one validated word record per call.
pub trait WordSource: Send + Sync {
    /// Acquire a fresh word record from the underlying provider(s).
    fn acquire(&self) -> BoxFuture<'static, WordSourceResult<WordRecord>>;
    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Instantiate the strategy selected in configuration.
pub fn from_config(config: &WordSourceConfig, client: Client) -> Arc<dyn WordSource> {
    match config {
        WordSourceConfig::Generative {
            vendor,
            endpoint,
            model,
            api_key_env,
        } => {
            let api_key = std::env::var(api_key_env)
                .ok()
                .filter(|value| !value.trim().is_empty());
            Arc::new(GenerativeWordSource::new(
                client,
                *vendor,
                endpoint.clone(),
                model.clone(),
                api_key_env.clone(),
                api_key,
            ))
        }
        WordSourceConfig::Lookup {
            word_list,
            dictionary_url,
            max_attempts,
        } => {
            let words: Arc<dyn WordListProvider> = match word_list {
                WordListConfig::Http { url } => {
                    Arc::new(HttpWordList::new(client.clone(), url.clone()))
                }
                WordListConfig::Static { words } => {
                    Arc::new(StaticWordList::new(words.clone()))
                }
            };
            let dictionary = Arc::new(HttpDictionary::new(client, dictionary_url.clone()));
            Arc::new(LookupWordSource::new(words, dictionary, *max_attempts))
        }
    }
}
