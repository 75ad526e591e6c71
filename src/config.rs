//! Startup configuration read from the environment.
//!
//! Recognized variables:
//!   OPENAI_API_KEY        : required, startup fails without it
//!   OPENAI_API_BASE       : default "https://api.openai.com/v1"
//!   OPENAI_API_MODEL_NAME : default "gpt-4o"
//!   PORT                  : u16, default 8000
//!
//! Values are read once in `main` and never change afterwards.

use std::net::SocketAddr;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Clone)]
pub struct ProviderConfig {
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

// Hand-written so the key never ends up in a log line.
impl std::fmt::Debug for ProviderConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ProviderConfig")
      .field("base_url", &self.base_url)
      .field("model", &self.model)
      .finish_non_exhaustive()
  }
}

impl ProviderConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|k| std::env::var(k).ok())
  }

  /// Same as `from_env` but reads through `lookup`, so tests don't touch the process env.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let api_key = lookup("OPENAI_API_KEY")
      .filter(|k| !k.trim().is_empty())
      .ok_or(ConfigError::MissingApiKey)?;
    let base_url = lookup("OPENAI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.into());
    let model = lookup("OPENAI_API_MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.into());

    Ok(Self {
      api_key,
      base_url: base_url.trim_end_matches('/').to_string(),
      model,
    })
  }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
  pub addr: SocketAddr,
}

impl ServerConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|k| std::env::var(k).ok())
  }

  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let port = match lookup("PORT") {
      Some(p) => p.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort(p))?,
      None => DEFAULT_PORT,
    };
    Ok(Self { addr: SocketAddr::from(([0, 0, 0, 0], port)) })
  }
}
