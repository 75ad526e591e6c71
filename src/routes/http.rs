//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameter sizes and basic result info.

use std::sync::Arc;
use axum::{
  extract::{rejection::QueryRejection, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::error::GenerationError;
use crate::logic::generate_problems;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, query), fields(request_id = %Uuid::new_v4()))]
pub async fn http_generate_problems(
  State(state): State<Arc<AppState>>,
  query: Result<Query<GenerateQuery>, QueryRejection>,
) -> Response {
  let q = match query {
    Ok(Query(q)) => q,
    Err(rejection) => {
      warn!(target: "parsons_backend", error = %rejection, "Rejected generate-problems query");
      return invalid_query(rejection);
    }
  };
  info!(target: "parsons_backend", spec_len = q.specification.len(), "Generating problem set");

  match generate_problems(&state.openai, &q.specification).await {
    Ok(problems) => {
      let n = problems.get("parsonsProblems").and_then(Value::as_array).map(Vec::len);
      info!(target: "parsons_backend", problems = ?n, "HTTP problem set served");
      Json(problems).into_response()
    }
    Err(e) => {
      error!(target: "parsons_backend", kind = e.kind(), error = %e, "Problem generation failed");
      e.into_response()
    }
  }
}

/// A malformed or incomplete query is a 422 with the same `detail` body as other failures.
fn invalid_query(rejection: QueryRejection) -> Response {
  let body = ErrorOut { detail: rejection.body_text() };
  (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
}

/// Every generation failure is a 500 with a `detail` message; the kind only shows up in logs.
impl IntoResponse for GenerationError {
  fn into_response(self) -> Response {
    let body = ErrorOut { detail: format!("Error generating problems: {self}") };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
  }
}
