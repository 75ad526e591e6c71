//! Public HTTP request/response structs (serde ready).
//! Keep this small and stable so clients can rely on it.

use serde::{Deserialize, Serialize};

/// Query of `GET /generate-problems`.
#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    /// Base64 of the task specification text.
    pub specification: String,
}

/// Body of every failed generation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub detail: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
