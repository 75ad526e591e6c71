//! Application state shared by all handlers.
//!
//! Built once at startup from the environment and never mutated afterwards;
//! handlers only read the provider client out of it.

use tracing::{info, instrument};

use crate::config::ProviderConfig;
use crate::error::ConfigError;
use crate::openai::OpenAI;

#[derive(Clone)]
pub struct AppState {
    pub openai: OpenAI,
}

impl AppState {
    /// Build state from env. Fails if `OPENAI_API_KEY` is missing.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(&ProviderConfig::from_env()?)
    }

    pub fn new(cfg: &ProviderConfig) -> Result<Self, ConfigError> {
        let openai = OpenAI::new(cfg)?;
        info!(target: "parsons_backend", base_url = %openai.base_url, model = %openai.model, "OpenAI client ready");
        Ok(Self { openai })
    }
}
