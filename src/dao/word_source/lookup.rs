//! Lookup strategy: draw a candidate word, keep the first one the dictionary can define.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use super::{
    DictionaryProvider, WordListProvider, WordSource, WordSourceError, WordSourceResult,
};
use crate::dao::models::WordRecord;

/// Draws random words until the dictionary knows one, within a fixed budget.
#[derive(Clone)]
pub struct LookupWordSource {
    words: Arc<dyn WordListProvider>,
    dictionary: Arc<dyn DictionaryProvider>,
    max_attempts: u32,
}

impl LookupWordSource {
    /// `max_attempts` is clamped to at least one candidate.
    pub fn new(
        words: Arc<dyn WordListProvider>,
        dictionary: Arc<dyn DictionaryProvider>,
        max_attempts: u32,
    ) -> Self {
        Self {
            words,
            dictionary,
            max_attempts: max_attempts.max(1),
        }
    }

    async fn run(self) -> WordSourceResult<WordRecord> {
        for attempt in 1..=self.max_attempts {
            let candidate = self.words.draw().await?;
            match self.dictionary.lookup(&candidate).await? {
                None => {
                    debug!(attempt, %candidate, "no dictionary entry; drawing again");
                }
                Some(entry) => match entry.into_record(&candidate) {
                    Some(record) => {
                        info!(attempt, word = %record.word, "dictionary lookup resolved word");
                        return Ok(record);
                    }
                    None => {
                        debug!(attempt, %candidate, "entry lacks definition or example; drawing again");
                    }
                },
            }
        }

        warn!(
            attempts = self.max_attempts,
            "lookup budget exhausted without a usable definition"
        );
        Err(WordSourceError::NoDefinitionFound {
            attempts: self.max_attempts,
        })
    }
}

impl WordSource for LookupWordSource {
    fn acquire(&self) -> BoxFuture<'static, WordSourceResult<WordRecord>> {
        Box::pin(self.clone().run())
    }

    fn name(&self) -> &'static str {
        "lookup"
    }
}
