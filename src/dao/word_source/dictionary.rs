//! Dictionary lookups and the rules picking a record out of an entry.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use super::{WordSourceError, WordSourceResult};
use crate::dao::models::WordRecord;

const PROVIDER: &str = "dictionary";

/// Looks up dictionary entries for a candidate word.
pub trait DictionaryProvider: Send + Sync {
    /// `Ok(None)` means the dictionary has no entry for `word`.
    fn lookup(&self, word: &str) -> BoxFuture<'static, WordSourceResult<Option<DictionaryEntry>>>;
}

/// One entry of a free-dictionary style response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DictionaryEntry {
    #[serde(default)]
    word: String,
    #[serde(default)]
    phonetic: Option<String>,
    #[serde(default)]
    phonetics: Vec<Phonetic>,
    #[serde(default)]
    meanings: Vec<Sense>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Phonetic {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    audio: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Sense {
    #[serde(default)]
    part_of_speech: Option<String>,
    #[serde(default)]
    definitions: Vec<Definition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Definition {
    #[serde(default)]
    definition: Option<String>,
    #[serde(default)]
    example: Option<String>,
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|text| !text.is_empty())
}

impl DictionaryEntry {
    /// Extract a word record, or `None` when the entry has no definition or example to show.
    pub fn into_record(self, candidate: &str) -> Option<WordRecord> {
        let phonetic = filled(&self.phonetic)
            .or_else(|| self.phonetics.iter().find_map(|p| filled(&p.text)))
            .map(str::to_owned);
        let audio_url = self
            .phonetics
            .iter()
            .find_map(|p| filled(&p.audio))
            .map(str::to_owned);

        let first_sense = self.meanings.first()?;
        let meaning = first_sense
            .definitions
            .first()
            .and_then(|d| filled(&d.definition))
            .map(str::to_owned);
        let part_of_speech = first_sense.part_of_speech.clone();
        let example = self
            .meanings
            .iter()
            .flat_map(|sense| sense.definitions.iter())
            .find_map(|d| filled(&d.example))
            .map(str::to_owned);

        let word = Some(self.word)
            .filter(|word| !word.trim().is_empty())
            .unwrap_or_else(|| candidate.to_owned());

        WordRecord::validated(Some(word), meaning, example)
            .ok()
            .map(|record| record.with_details(phonetic, part_of_speech, audio_url))
    }
}

/// Dictionary reached over HTTP at `<base_url>/<word>`, the word escaped as one path segment.
#[derive(Clone)]
pub struct HttpDictionary {
    client: Client,
    base_url: Arc<str>,
}

impl HttpDictionary {
    /// Entries live under `base_url`, e.g. `https://api.dictionaryapi.dev/api/v2/entries/en/`.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: Arc::from(base_url.into()),
        }
    }
}

impl DictionaryProvider for HttpDictionary {
    fn lookup(&self, word: &str) -> BoxFuture<'static, WordSourceResult<Option<DictionaryEntry>>> {
        let dictionary = self.clone();
        let url = entry_url(&self.base_url, word);
        Box::pin(async move {
            let url = url.map_err(|err| WordSourceError::unavailable(PROVIDER, err))?;
            let response = dictionary
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|err| WordSourceError::unavailable(PROVIDER, err))?;

            match response.status() {
                StatusCode::NOT_FOUND => Ok(None),
                status if status.is_success() => {
                    let entries = response
                        .json::<Vec<DictionaryEntry>>()
                        .await
                        .map_err(|err| WordSourceError::invalid(PROVIDER, err))?;
                    Ok(entries.into_iter().next())
                }
                status => Err(WordSourceError::unavailable(
                    PROVIDER,
                    format!("unexpected status {status} for `{url}`"),
                )),
            }
        })
    }
}

fn entry_url(base_url: &str, word: &str) -> Result<Url, String> {
    let mut url =
        Url::parse(base_url).map_err(|err| format!("invalid dictionary URL `{base_url}`: {err}"))?;
    url.path_segments_mut()
        .map_err(|()| format!("dictionary URL `{base_url}` cannot take a path"))?
        .pop_if_empty()
        .push(word);
    Ok(url)
}
