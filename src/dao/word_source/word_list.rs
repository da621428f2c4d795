//! Sources of candidate words for the lookup strategy.

use std::sync::Arc;

use futures::future::BoxFuture;
use rand::{rng, seq::IndexedRandom};
use reqwest::Client;

use super::{WordSourceError, WordSourceResult};

const PROVIDER: &str = "word list";

/// Supplies random candidate words for the lookup strategy.
pub trait WordListProvider: Send + Sync {
    /// Draw one candidate word.
    fn draw(&self) -> BoxFuture<'static, WordSourceResult<String>>;
}

/// Remote list answering `GET` with a JSON array holding one word.
#[derive(Clone)]
pub struct HttpWordList {
    client: Client,
    url: Arc<str>,
}

impl HttpWordList {
    /// Point the provider at `url` (e.g. `https://random-word-api.herokuapp.com/word?number=1`).
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: Arc::from(url.into()),
        }
    }
}

impl WordListProvider for HttpWordList {
    fn draw(&self) -> BoxFuture<'static, WordSourceResult<String>> {
        let provider = self.clone();
        Box::pin(async move {
            let response = provider
                .client
                .get(provider.url.as_ref())
                .send()
                .await
                .map_err(|err| WordSourceError::unavailable(PROVIDER, err))?;

            let status = response.status();
            if !status.is_success() {
                return Err(WordSourceError::unavailable(
                    PROVIDER,
                    format!("unexpected status {status}"),
                ));
            }

            let words = response
                .json::<Vec<String>>()
                .await
                .map_err(|err| WordSourceError::invalid(PROVIDER, err))?;

            words
                .into_iter()
                .map(|word| word.trim().to_owned())
                .find(|word| !word.is_empty())
                .ok_or_else(|| WordSourceError::invalid(PROVIDER, "empty word list"))
        })
    }
}

/// Fixed list from configuration, drawn uniformly at random.
#[derive(Debug, Clone)]
pub struct StaticWordList {
    words: Arc<[String]>,
}

impl StaticWordList {
    /// Keep the non-blank entries of `words`.
    pub fn new(words: Vec<String>) -> Self {
        let words = words
            .into_iter()
            .map(|word| word.trim().to_owned())
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>();
        Self {
            words: Arc::from(words),
        }
    }
}

impl WordListProvider for StaticWordList {
    fn draw(&self) -> BoxFuture<'static, WordSourceResult<String>> {
        let drawn = self
            .words
            .choose(&mut rng())
            .cloned()
            .ok_or_else(|| WordSourceError::invalid(PROVIDER, "configured word list is empty"));
        Box::pin(async move { drawn })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_list_draws_configured_words() {
        let list = StaticWordList::new(vec!["  ".into(), "lucid".into(), "verdant".into()]);
        for _ in 0..20 {
            let word = list.draw().await.unwrap();
            assert!(word == "lucid" || word == "verdant", "unexpected {word}");
        }
    }

    #[tokio::test]
    async fn empty_static_list_is_invalid_content() {
        let list = StaticWordList::new(vec![" ".into()]);
        let err = list.draw().await.unwrap_err();
        assert_eq!(err.kind(), "invalid_content");
    }
}
