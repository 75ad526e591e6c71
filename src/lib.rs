//! Parsons problem generation backend.
//!
//! Forwards a task specification to an OpenAI-compatible chat-completion API
//! with a fixed instruction and hands back the JSON problem set, either as one
//! response (`logic`) or as a stream of text fragments (`streaming`).

pub mod config;
pub mod domain;
pub mod error;
pub mod logic;
pub mod openai;
pub mod prompt;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod streaming;
pub mod telemetry;
