//! Error types for generation and startup.
//!
//! `GenerationError` is what the core functions return; the HTTP layer turns it
//! into a single 500 response (see `routes::http`). `ConfigError` only happens
//! at startup and stops the process.

use thiserror::Error;

/// The encoded specification could not be turned into text.
#[derive(Debug, Error)]
pub enum DecodeError {
  #[error("invalid base64: {0}")]
  Base64(#[from] base64::DecodeError),
  #[error("specification is not valid UTF-8: {0}")]
  Utf8(#[from] std::string::FromUtf8Error),
}

/// Anything that went wrong talking to the chat-completion provider.
#[derive(Debug, Error)]
pub enum ProviderError {
  #[error("request to provider failed: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("OpenAI HTTP {status}: {message}")]
  Status { status: reqwest::StatusCode, message: String },
  #[error("provider response carried no message content")]
  EmptyCompletion,
  #[error("provider stream error: {0}")]
  Stream(String),
}

#[derive(Debug, Error)]
pub enum GenerationError {
  #[error(transparent)]
  Decode(#[from] DecodeError),
  #[error(transparent)]
  Provider(#[from] ProviderError),
  #[error("provider returned invalid JSON: {0}")]
  Parse(#[from] serde_json::Error),
}

impl GenerationError {
  /// Short tag used in logs.
  pub fn kind(&self) -> &'static str {
    match self {
      GenerationError::Decode(_) => "decode",
      GenerationError::Provider(_) => "provider",
      GenerationError::Parse(_) => "parse",
    }
  }
}

impl From<reqwest::Error> for GenerationError {
  fn from(e: reqwest::Error) -> Self {
    GenerationError::Provider(ProviderError::Transport(e))
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("OPENAI_API_KEY is not set; export it before starting the server")]
  MissingApiKey,
  #[error("PORT must be a valid u16, got {0:?}")]
  InvalidPort(String),
  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),
}
