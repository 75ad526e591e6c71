//! Local stand-in for an OpenAI-compatible provider plus helpers to boot the app.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
  body::Body,
  extract::State,
  http::{header, HeaderMap, StatusCode},
  response::{IntoResponse, Response},
  routing::post,
  Json, Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use parsons_backend::config::ProviderConfig;
use parsons_backend::openai::OpenAI;
use parsons_backend::routes::build_router;
use parsons_backend::state::AppState;

pub const API_KEY: &str = "sk-test-key";
pub const MODEL: &str = "test-model";

pub enum Reply {
  /// Same text either way: one message, or SSE chunks of `fragment_len` chars.
  Content { text: String, fragment_len: usize },
  Status { status: u16, body: String },
  /// Streams `before`, then an in-band error payload.
  StreamError { before: Vec<String>, message: String },
  /// Streams one fragment, then keeps sending whitespace until the client hangs up.
  Endless,
}

#[derive(Clone, Debug)]
pub struct Recorded {
  pub authorization: Option<String>,
  pub body: Value,
}

pub struct MockProvider {
  reply: Reply,
  requests: Mutex<Vec<Recorded>>,
  hung_up: Mutex<Option<oneshot::Sender<()>>>,
}

impl MockProvider {
  pub fn requests(&self) -> Vec<Recorded> {
    self.requests.lock().unwrap().clone()
  }
}

pub struct Provider {
  pub base_url: String,
  pub mock: Arc<MockProvider>,
  pub hung_up: oneshot::Receiver<()>,
}

impl Provider {
  pub fn config(&self) -> ProviderConfig {
    ProviderConfig { api_key: API_KEY.into(), base_url: self.base_url.clone(), model: MODEL.into() }
  }

  pub fn client(&self) -> OpenAI {
    OpenAI::new(&self.config()).unwrap()
  }
}

pub async fn spawn_provider(reply: Reply) -> Provider {
  let (tx, rx) = oneshot::channel();
  let mock = Arc::new(MockProvider { reply, requests: Mutex::new(Vec::new()), hung_up: Mutex::new(Some(tx)) });
  let router = Router::new().route("/v1/chat/completions", post(completions)).with_state(mock.clone());
  let addr = serve(router).await;
  Provider { base_url: format!("http://{addr}/v1"), mock, hung_up: rx }
}

/// Boot the real application against `provider`; returns its base URL.
pub async fn spawn_app(provider: &Provider) -> String {
  let state = Arc::new(AppState::new(&provider.config()).unwrap());
  let addr = serve(build_router(state)).await;
  format!("http://{addr}")
}

async fn serve(router: Router) -> SocketAddr {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, router).await.unwrap();
  });
  addr
}

pub fn sample_document(num_problems: usize) -> Value {
  let problems: Vec<Value> = (1..=num_problems)
    .map(|i| {
      json!({
        "id": format!("parsons{i}"),
        "prompt": "Assign 5 to x and print it.",
        "statements": [
          { "text": "x = 5", "order": 1, "feedbackWrong": "Assign before printing." },
          { "text": "print(x)", "order": 2, "feedbackWrong": "Print after assigning." },
          { "text": "x == 5", "distractor": true, "feedback": "That compares, it does not assign." }
        ]
      })
    })
    .collect();
  json!({
    "_thoughts": "one easy assignment problem",
    "title": "Variables in Python",
    "description": "Put the lines in order.",
    "welcomeHeader": "Welcome",
    "certificateTitle": "🎉 Certificate of Completion 🎉",
    "assignmentName": "Variable Assignment",
    "parsonsProblems": problems
  })
}

fn sse_chunk(content: &str) -> String {
  let chunk = json!({
    "id": "chatcmpl-test",
    "object": "chat.completion.chunk",
    "choices": [{ "index": 0, "delta": { "content": content }, "finish_reason": null }]
  });
  format!("data: {chunk}\n\n")
}

fn split_chars(text: &str, n: usize) -> Vec<String> {
  let chars: Vec<char> = text.chars().collect();
  chars.chunks(n.max(1)).map(|c| c.iter().collect()).collect()
}

fn sse_response(body: Body) -> Response {
  ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

struct HangUpGuard(Option<oneshot::Sender<()>>);

impl Drop for HangUpGuard {
  fn drop(&mut self) {
    if let Some(tx) = self.0.take() {
      let _ = tx.send(());
    }
  }
}

async fn completions(
  State(mock): State<Arc<MockProvider>>,
  headers: HeaderMap,
  Json(body): Json<Value>,
) -> Response {
  let authorization = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_string);
  let stream = body.get("stream").and_then(Value::as_bool).unwrap_or(false);
  mock.requests.lock().unwrap().push(Recorded { authorization, body });

  match &mock.reply {
    Reply::Status { status, body } => {
      let status = StatusCode::from_u16(*status).unwrap();
      (status, [(header::CONTENT_TYPE, "application/json")], body.clone()).into_response()
    }
    Reply::Content { text, fragment_len } if stream => {
      let mut sse: String = split_chars(text, *fragment_len).iter().map(|f| sse_chunk(f)).collect();
      sse.push_str("data: [DONE]\n\n");
      sse_response(Body::from(sse))
    }
    Reply::Content { text, .. } => Json(json!({
      "id": "chatcmpl-test",
      "object": "chat.completion",
      "model": MODEL,
      "choices": [{ "index": 0, "message": { "role": "assistant", "content": text }, "finish_reason": "stop" }],
      "usage": { "prompt_tokens": 900, "completion_tokens": 300, "total_tokens": 1200 }
    }))
    .into_response(),
    Reply::StreamError { before, message } => {
      let mut sse: String = before.iter().map(|f| sse_chunk(f)).collect();
      sse.push_str(&format!("data: {}\n\n", json!({ "error": { "message": message } })));
      sse_response(Body::from(sse))
    }
    Reply::Endless => {
      let guard = HangUpGuard(mock.hung_up.lock().unwrap().take());
      let first = futures::stream::once(async { Ok::<_, std::io::Error>(sse_chunk("{")) });
      let rest = futures::stream::unfold((), |_| async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Some((Ok(sse_chunk(" ")), ()))
      });
      let body = first.chain(rest).map(move |item| {
        let _held = &guard;
        item
      });
      sse_response(Body::from_stream(body))
    }
  }
}
