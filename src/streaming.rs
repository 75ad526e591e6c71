//! Streaming generation: the same request as `logic::generate_problems`, but
//! with `stream: true`, handing text fragments to the caller as they arrive.
//!
//! A spawned reader task owns the provider response and feeds a bounded
//! channel. When the consumer drops its `ProblemStream` the task notices
//! (even mid-wait) and drops the response, which closes the connection.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, instrument, Instrument};
use uuid::Uuid;

use crate::domain::{ParsonsProblemDocument, TaskSpecification};
use crate::error::{GenerationError, ProviderError};
use crate::openai::{extract_openai_error, ChatCompletionChunk, OpenAI};
use crate::prompt::build_messages;

const CHANNEL_CAPACITY: usize = 32;

type Fragment = Result<String, GenerationError>;

/// Open a streaming generation for `spec`.
///
/// Errors before the first byte (bad status, unreachable provider) come back
/// here; later failures arrive as an `Err` item on the stream, which then ends.
#[instrument(level = "info", skip(openai, spec), fields(language = %spec.language, num_problems = spec.num_problems.get()))]
pub async fn generate_problems_stream(
  openai: &OpenAI,
  spec: &TaskSpecification,
) -> Result<ProblemStream, GenerationError> {
  let user = serde_json::to_string(spec)?;
  let res = openai.chat_json_stream(build_messages(&user)).await?;

  let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
  let span = info_span!("problem_stream", request_id = %Uuid::new_v4());
  tokio::spawn(pump(res, tx).instrument(span));

  Ok(ProblemStream { rx })
}

/// Lazy, single-use sequence of content fragments.
pub struct ProblemStream {
  rx: mpsc::Receiver<Fragment>,
}

impl ProblemStream {
  pub async fn next_fragment(&mut self) -> Option<Fragment> {
    self.rx.recv().await
  }

  /// Stop early. The provider connection is closed; no more fragments are read.
  pub fn cancel(self) {
    drop(self);
  }

  /// Drain the stream and join every fragment.
  pub async fn collect_text(mut self) -> Result<String, GenerationError> {
    let mut text = String::new();
    while let Some(fragment) = self.rx.recv().await {
      text.push_str(&fragment?);
    }
    Ok(text)
  }

  pub async fn collect_document(self) -> Result<ParsonsProblemDocument, GenerationError> {
    let text = self.collect_text().await?;
    Ok(serde_json::from_str(&text)?)
  }
}

impl Stream for ProblemStream {
  type Item = Fragment;

  fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    self.rx.poll_recv(cx)
  }
}

async fn pump(res: reqwest::Response, tx: mpsc::Sender<Fragment>) {
  let mut body = Box::pin(res.bytes_stream());
  let mut decoder = SseDecoder::default();
  let mut sent = 0usize;

  loop {
    let next = tokio::select! {
      biased;
      _ = tx.closed() => {
        info!(fragments = sent, "Consumer went away; closing provider stream");
        return;
      }
      item = body.next() => item,
    };

    let (events, eof) = match next {
      Some(Ok(bytes)) => (decoder.push(&bytes), false),
      Some(Err(e)) => {
        error!(error = %e, "Provider stream read failed");
        let _ = tx.send(Err(e.into())).await;
        return;
      }
      None => (decoder.finish(), true),
    };

    for data in events {
      match parse_data(&data) {
        Payload::Fragment(text) => {
          if tx.send(Ok(text)).await.is_err() {
            info!(fragments = sent, "Consumer went away; closing provider stream");
            return;
          }
          sent += 1;
        }
        Payload::Nothing => {}
        Payload::Done => {
          info!(fragments = sent, "Provider stream finished");
          return;
        }
        Payload::Failed(e) => {
          error!(error = %e, "Provider stream carried an error");
          let _ = tx.send(Err(e)).await;
          return;
        }
      }
    }

    if eof {
      info!(fragments = sent, "Provider closed stream");
      return;
    }
  }
}

#[derive(Debug)]
enum Payload {
  Fragment(String),
  Nothing,
  Done,
  Failed(GenerationError),
}

/// Interpret one SSE `data` payload of an OpenAI chat stream.
fn parse_data(data: &str) -> Payload {
  let data = data.trim();
  if data == "[DONE]" {
    return Payload::Done;
  }
  if let Some(msg) = extract_openai_error(data) {
    return Payload::Failed(ProviderError::Stream(msg).into());
  }
  match serde_json::from_str::<ChatCompletionChunk>(data) {
    Ok(chunk) => match chunk.choices.into_iter().next().and_then(|c| c.delta.content) {
      Some(text) if !text.is_empty() => Payload::Fragment(text),
      _ => Payload::Nothing,
    },
    Err(e) => Payload::Failed(e.into()),
  }
}

/// Incremental server-sent-events decoder. Only `data` fields matter to us.
///
/// Bytes are buffered until a full line is available, so UTF-8 sequences and
/// lines split across network chunks come out whole.
#[derive(Default)]
struct SseDecoder {
  buf: Vec<u8>,
  data: Option<String>,
}

impl SseDecoder {
  /// Feed bytes; returns the data payloads of every event completed by them.
  fn push(&mut self, bytes: &[u8]) -> Vec<String> {
    self.buf.extend_from_slice(bytes);
    let mut events = Vec::new();

    while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
      let line: Vec<u8> = self.buf.drain(..=pos).collect();
      let line = String::from_utf8_lossy(&line);
      let line = line.trim_end_matches(['\n', '\r']);
      self.line(line, &mut events);
    }
    events
  }

  /// End of input: a trailing line without newline, or an event without its blank line.
  fn finish(&mut self) -> Vec<String> {
    let mut events = Vec::new();
    if !self.buf.is_empty() {
      let rest = std::mem::take(&mut self.buf);
      let rest = String::from_utf8_lossy(&rest);
      self.line(rest.trim_end_matches('\r'), &mut events);
    }
    if let Some(data) = self.data.take() {
      events.push(data);
    }
    events
  }

  fn line(&mut self, line: &str, events: &mut Vec<String>) {
    if line.is_empty() {
      if let Some(data) = self.data.take() {
        events.push(data);
      }
      return;
    }
    if line.starts_with(':') {
      return;
    }
    let (field, value) = match line.split_once(':') {
      Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
      None => (line, ""),
    };
    if field == "data" {
      match &mut self.data {
        Some(d) => {
          d.push('\n');
          d.push_str(value);
        }
        None => self.data = Some(value.to_string()),
      }
    } else {
      debug!(field, "Ignoring SSE field");
    }
  }
}
