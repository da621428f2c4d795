//! Generative strategy backed by an OpenAI-compatible chat-completions endpoint.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{WordSource, WordSourceError, WordSourceResult};
use crate::dao::models::WordRecord;

const PROVIDER: &str = "text generation";

/// Fixed instruction sent on every cache miss.
const INSTRUCTION: &str = "Give one English word of the day as a single JSON object with exactly \
these string fields: word, meaning, example, phonetic, partOfSpeech. Reply with the JSON object only.";

/// OpenAI-compatible chat-completions vendors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerativeVendor {
    /// Groq hosted models.
    #[default]
    Groq,
    /// OpenAI.
    #[serde(rename = "openai")]
    OpenAi,
    /// Any compatible endpoint; endpoint and model must be configured.
    Custom,
}

impl GenerativeVendor {
    fn default_endpoint(self) -> Option<&'static str> {
        match self {
            GenerativeVendor::Groq => Some("https://api.groq.com/openai/v1/chat/completions"),
            GenerativeVendor::OpenAi => Some("https://api.openai.com/v1/chat/completions"),
            GenerativeVendor::Custom => None,
        }
    }

    fn default_model(self) -> Option<&'static str> {
        match self {
            GenerativeVendor::Groq => Some("llama3-8b-8192"),
            GenerativeVendor::OpenAi => Some("gpt-4o-mini"),
            GenerativeVendor::Custom => None,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Shape the instruction asks the model to produce.
#[derive(Deserialize)]
struct GeneratedWord {
    word: Option<String>,
    meaning: Option<String>,
    example: Option<String>,
    #[serde(default)]
    phonetic: Option<String>,
    #[serde(default, alias = "part_of_speech", rename = "partOfSpeech")]
    part_of_speech: Option<String>,
}

/// Asks a text-generation endpoint for the word, once per call and without retry.
#[derive(Clone)]
pub struct GenerativeWordSource {
    inner: Arc<GenerativeInner>,
}

struct GenerativeInner {
    client: Client,
    endpoint: Option<String>,
    model: Option<String>,
    api_key_env: String,
    api_key: Option<String>,
}

impl GenerativeWordSource {
    /// Explicit `endpoint`/`model` override the vendor defaults.
    pub fn new(
        client: Client,
        vendor: GenerativeVendor,
        endpoint: Option<String>,
        model: Option<String>,
        api_key_env: String,
        api_key: Option<String>,
    ) -> Self {
        let endpoint = endpoint.or_else(|| vendor.default_endpoint().map(str::to_owned));
        let model = model.or_else(|| vendor.default_model().map(str::to_owned));
        Self {
            inner: Arc::new(GenerativeInner {
                client,
                endpoint,
                model,
                api_key_env,
                api_key,
            }),
        }
    }

    async fn generate(self) -> WordSourceResult<WordRecord> {
        let inner = &self.inner;
        let api_key = inner.api_key.as_deref().ok_or_else(|| {
            WordSourceError::unavailable(
                PROVIDER,
                format!("secret `{}` is not set", inner.api_key_env),
            )
        })?;
        let (Some(endpoint), Some(model)) = (inner.endpoint.as_deref(), inner.model.as_deref())
        else {
            return Err(WordSourceError::unavailable(
                PROVIDER,
                "endpoint or model is not configured",
            ));
        };

        let request = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: INSTRUCTION,
            }],
        };

        let response = inner
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| WordSourceError::unavailable(PROVIDER, err))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(WordSourceError::unavailable(
                    PROVIDER,
                    format!("credentials rejected ({})", response.status()),
                ));
            }
            status if !status.is_success() => {
                return Err(WordSourceError::unavailable(
                    PROVIDER,
                    format!("unexpected status {status}"),
                ));
            }
            _ => {}
        }

        let body = response
            .json::<ChatResponse>()
            .await
            .map_err(|err| WordSourceError::invalid(PROVIDER, err))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| WordSourceError::invalid(PROVIDER, "response has no message content"))?;

        let record = parse_generated(&content)?;
        info!(word = %record.word, model, "generated word of the day");
        Ok(record)
    }
}

impl WordSource for GenerativeWordSource {
    fn acquire(&self) -> BoxFuture<'static, WordSourceResult<WordRecord>> {
        Box::pin(self.clone().generate())
    }

    fn name(&self) -> &'static str {
        "generative"
    }
}

/// Parse the model's reply, tolerating a Markdown code fence around the JSON.
fn parse_generated(content: &str) -> WordSourceResult<WordRecord> {
    let generated = serde_json::from_str::<GeneratedWord>(strip_code_fence(content))
        .map_err(|err| WordSourceError::invalid(PROVIDER, err))?;

    WordRecord::validated(generated.word, generated.meaning, generated.example)
        .map(|record| record.with_details(generated.phonetic, generated.part_of_speech, None))
        .map_err(|err| WordSourceError::invalid(PROVIDER, err))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the optional language tag on the opening fence.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
