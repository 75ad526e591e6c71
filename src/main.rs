//! Parsons problem generator backend
//!
//! - Axum HTTP API: `GET /generate-problems?specification=<base64>`
//! - OpenAI-compatible provider configured from environment variables
//!
//! Important env variables:
//!   PORT                  : u16 (default 8000)
//!   OPENAI_API_KEY        : required; the server refuses to start without it
//!   OPENAI_API_BASE       : default "https://api.openai.com/v1"
//!   OPENAI_API_MODEL_NAME : default "gpt-4o"
//!   LOG_LEVEL             : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT            : "pretty" (default) or "json"

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use parsons_backend::config::ServerConfig;
use parsons_backend::routes::build_router;
use parsons_backend::state::AppState;
use parsons_backend::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Provider client is built once; a missing key stops us here.
  let state = match AppState::from_env() {
    Ok(s) => Arc::new(s),
    Err(e) => {
      error!(target: "parsons_backend", error = %e, "Startup configuration invalid");
      return Err(e.into());
    }
  };
  let server = ServerConfig::from_env()?;

  let app = build_router(state);

  let listener = TcpListener::bind(server.addr).await?;
  info!(target: "parsons_backend", addr = %server.addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "parsons_backend", "HTTP server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(target: "parsons_backend", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!(target: "parsons_backend", "Shutdown signal received");
}
