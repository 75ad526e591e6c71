//! Core non-streaming generation, shared by the HTTP handler and anything else
//! that holds an `OpenAI` client.

use std::time::Instant;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::domain::{ParsonsProblemDocument, TaskSpecification};
use crate::error::{DecodeError, GenerationError};
use crate::openai::OpenAI;
use crate::prompt::build_messages;

// Standard alphabet, padding required, stray bits in the last symbol ignored.
const SPEC_DECODER: GeneralPurpose = GeneralPurpose::new(
  &alphabet::STANDARD,
  GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Standard base64 (padded) to UTF-8 text. ASCII whitespace in the input is ignored.
pub fn decode_specification(encoded: &str) -> Result<String, DecodeError> {
  let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
  let bytes = SPEC_DECODER.decode(compact.as_bytes())?;
  Ok(String::from_utf8(bytes)?)
}

/// Inverse of `decode_specification` for a typed specification.
pub fn encode_specification(spec: &TaskSpecification) -> Result<String, serde_json::Error> {
  Ok(STANDARD.encode(serde_json::to_string(spec)?))
}

/// Decode the caller's specification, ask the provider for a problem set and
/// return its JSON exactly as received.
///
/// Nothing is sent to the provider if decoding fails.
#[instrument(level = "info", skip(openai, encoded), fields(encoded_len = encoded.len()))]
pub async fn generate_problems(openai: &OpenAI, encoded: &str) -> Result<Value, GenerationError> {
  let decoded = decode_specification(encoded)?;
  debug!(spec_len = decoded.len(), "Specification decoded");

  let start = Instant::now();
  let text = openai.chat_json_text(build_messages(&decoded)).await?;
  let elapsed = start.elapsed();

  let value: Value = serde_json::from_str(&text)?;
  info!(?elapsed, content_len = text.len(), "Problem set generated");

  report_document_issues(&decoded, &value);
  Ok(value)
}

/// Log what looks wrong with a generated document. Never changes the response.
fn report_document_issues(decoded_spec: &str, value: &Value) {
  let expected = serde_json::from_str::<TaskSpecification>(decoded_spec)
    .ok()
    .map(|s| s.num_problems.get());

  match ParsonsProblemDocument::deserialize(value) {
    Ok(doc) => {
      for issue in doc.check(expected) {
        warn!(%issue, "Generated document failed post-check");
      }
    }
    Err(e) => warn!(error = %e, "Provider JSON does not match the Parsons document shape"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::num::NonZeroU32;

  #[test]
  fn decodes_standard_base64() {
    let encoded = STANDARD.encode(r#"{"language":"Python"}"#);
    assert_eq!(decode_specification(&encoded).unwrap(), r#"{"language":"Python"}"#);
  }

  #[test]
  fn ignores_embedded_whitespace() {
    let encoded = STANDARD.encode("hello parsons");
    let (a, b) = encoded.split_at(6);
    assert_eq!(decode_specification(&format!(" {a}\n{b} ")).unwrap(), "hello parsons");
  }

  #[test]
  fn accepts_non_canonical_trailing_bits() {
    // canonical form of "ab" is "YWI="
    assert_eq!(decode_specification("YWJ=").unwrap(), "ab");
  }

  #[test]
  fn rejects_bad_base64_and_bad_utf8() {
    assert!(matches!(decode_specification("not base64!!"), Err(DecodeError::Base64(_))));
    assert!(matches!(decode_specification("YWJj="), Err(DecodeError::Base64(_))));
    let bad_utf8 = STANDARD.encode([0xc3, 0x28]);
    assert!(matches!(decode_specification(&bad_utf8), Err(DecodeError::Utf8(_))));
  }

  #[test]
  fn encode_then_decode_gives_json() {
    let spec = TaskSpecification {
      language: "Python".into(),
      concepts: Default::default(),
      num_problems: NonZeroU32::new(2).unwrap(),
    };
    let text = decode_specification(&encode_specification(&spec).unwrap()).unwrap();
    assert_eq!(serde_json::from_str::<TaskSpecification>(&text).unwrap(), spec);
  }
}
