// SPDX-License-Identifier: MIT OR Apache-2.0
//! HTTP-backed [`Llm`](crate::Llm) implementations.
//!
//! Each provider honors the bounded-timeout rule: 60 s for one-shot
//! completions, 120 s for streaming.

pub mod anthropic;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicHttp;
pub use ollama::OllamaHttp;
pub use openai::OpenAiHttp;

use crate::LlmError;
use std::time::Duration;

/// Timeout for one-shot completions.
pub(crate) const COMPLETE_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout for streaming generations.
pub(crate) const STREAM_TIMEOUT: Duration = Duration::from_secs(120);

/// Check the status and decode the body as JSON.
pub(crate) async fn read_json_response(
    resp: reqwest::Response,
) -> Result<serde_json::Value, LlmError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let body = body.chars().take(500).collect();
        return Err(LlmError::Status {
            status: status.as_u16(),
            body,
        });
    }
    resp.json().await.map_err(LlmError::from)
}

/// In json mode, try to parse the generated text as a JSON value.
pub(crate) fn maybe_parse_json(json_mode: bool, text: &str) -> Option<serde_json::Value> {
    if json_mode {
        serde_json::from_str(text).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maybe_parse_json_only_in_json_mode() {
        assert!(maybe_parse_json(false, "{\"a\":1}").is_none());
        assert_eq!(
            maybe_parse_json(true, "{\"a\":1}").unwrap()["a"],
            serde_json::json!(1)
        );
        assert!(maybe_parse_json(true, "not json").is_none());
    }
}
