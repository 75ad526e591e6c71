//! Minimal OpenAI-compatible client for our use-cases.
//!
//! We only call chat.completions, always asking for a JSON object, either as one
//! response or as an SSE stream. Calls are instrumented and log model names,
//! latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError};

const CLIENT_UA: &str = concat!("parsons-backend/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl OpenAI {
  /// No request timeout is set; a generation runs as long as the provider keeps the connection.
  pub fn new(cfg: &ProviderConfig) -> Result<Self, ConfigError> {
    let client = reqwest::Client::builder().user_agent(CLIENT_UA).build()?;
    Ok(Self {
      client,
      api_key: cfg.api_key.clone(),
      base_url: cfg.base_url.clone(),
      model: cfg.model.clone(),
    })
  }

  fn completions_url(&self) -> String {
    format!("{}/chat/completions", self.base_url)
  }

  fn json_request(&self, messages: Vec<ChatMessageReq>, stream: bool) -> ChatCompletionRequest {
    ChatCompletionRequest {
      model: self.model.clone(),
      messages,
      response_format: ResponseFormat { r#type: "json_object".into() },
      stream: stream.then_some(true),
    }
  }

  /// JSON-mode chat completion. Returns the raw `content` string of the first choice.
  #[instrument(level = "info", skip(self, messages), fields(model = %self.model, n_messages = messages.len()))]
  pub async fn chat_json_text(&self, messages: Vec<ChatMessageReq>) -> Result<String, ProviderError> {
    let req = self.json_request(messages, false);

    let res = self.client.post(self.completions_url())
      .header(USER_AGENT, CLIENT_UA)
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    let res = check_status(res).await?;

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }

    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .ok_or(ProviderError::EmptyCompletion)?;
    info!(content_len = text.len(), "OpenAI completion received");
    Ok(text)
  }

  /// JSON-mode chat completion with `stream: true`. Returns the open response once
  /// the status line says success; the body is an OpenAI SSE stream.
  #[instrument(level = "info", skip(self, messages), fields(model = %self.model, n_messages = messages.len()))]
  pub async fn chat_json_stream(&self, messages: Vec<ChatMessageReq>) -> Result<reqwest::Response, ProviderError> {
    let req = self.json_request(messages, true);

    let res = self.client.post(self.completions_url())
      .header(USER_AGENT, CLIENT_UA)
      .header(CONTENT_TYPE, "application/json")
      .header(ACCEPT, "text/event-stream")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    let res = check_status(res).await?;
    info!(status = %res.status(), "OpenAI stream opened");
    Ok(res)
  }
}

async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
  if res.status().is_success() {
    return Ok(res);
  }
  let status = res.status();
  let body = res.text().await.unwrap_or_default();
  let message = extract_openai_error(&body).unwrap_or(body);
  warn!(%status, "OpenAI request rejected");
  Err(ProviderError::Status { status, message })
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  response_format: ResponseFormat,
  #[serde(skip_serializing_if = "Option::is_none")]
  stream: Option<bool>,
}
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessageReq { pub role: String, pub content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  #[serde(default)] choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// One `data:` payload of a streaming response.
#[derive(Deserialize)]
pub(crate) struct ChatCompletionChunk {
  #[serde(default)] pub choices: Vec<ChunkChoice>,
}
#[derive(Deserialize)]
pub(crate) struct ChunkChoice {
  #[serde(default)] pub delta: ChunkDelta,
}
#[derive(Deserialize, Default)]
pub(crate) struct ChunkDelta {
  #[serde(default)] pub content: Option<String>,
}

/// Try to extract a clean error message from OpenAI error body.
pub(crate) fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
