// SPDX-License-Identifier: MIT OR Apache-2.0
//! steward-llm
//!
//! The completion/stream oracle the schedulers and controllers consume, plus
//! everything that keeps untrusted text at arm's length from it: the
//! sanitizer, the prompt library, and strict schema validation of structured
//! outputs. The core never depends on a specific provider; each HTTP-backed
//! implementation lives behind the [`Llm`] trait.
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Prompt texts used by schedulers and controllers.
pub mod prompts;
/// HTTP-backed providers.
pub mod providers;
/// Provider selection from configuration.
pub mod router;
/// Untrusted-text sanitization.
pub mod sanitize;
/// Structured-output validation.
pub mod schema;

pub use router::build_llm;
pub use sanitize::sanitize_untrusted_text;
pub use schema::parse_intent_batch;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Errors surfaced by LLM providers.
///
/// Callers never escalate these; a failed call falls back to heuristics.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("llm transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status from the provider.
    #[error("llm provider returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The provider's response body did not have the expected shape.
    #[error("llm response malformed: {0}")]
    Malformed(String),
}

/// A completed generation.
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    /// The generated text, trimmed.
    pub text: String,
    /// Parsed JSON when the call asked for `json_mode` and the text parsed.
    pub json: Option<serde_json::Value>,
    /// Model that produced the response.
    pub model: String,
    /// Provider-reported usage, when available.
    pub usage: Option<serde_json::Value>,
}

/// Stream of text chunks from a generation.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// The capability set the core consumes from a language model.
#[async_trait]
pub trait Llm: Send + Sync {
    /// One-shot completion. With `json_mode`, the provider is asked for
    /// strict JSON and the parsed value rides along in
    /// [`LlmResponse::json`] (`None` when parsing fails).
    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<LlmResponse, LlmError>;

    /// Streaming completion. Providers without native streaming re-emit a
    /// full completion in fixed-size chunks.
    async fn stream(&self, system: &str, user: &str) -> Result<TextStream, LlmError>;
}

/// Re-emit `text` as a stream of chunks of at most 120 characters.
///
/// The fallback used by providers that cannot stream natively.
pub(crate) fn chunked_stream(text: String) -> TextStream {
    let chunks: Vec<String> = {
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(120)
            .map(|c| c.iter().collect::<String>())
            .collect()
    };
    Box::pin(futures::stream::iter(chunks.into_iter().map(Ok)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn chunked_stream_preserves_text() {
        let text = "x".repeat(301);
        let mut stream = chunked_stream(text.clone());
        let mut out = String::new();
        let mut chunks = 0;
        while let Some(chunk) = stream.next().await {
            out.push_str(&chunk.unwrap());
            chunks += 1;
        }
        assert_eq!(out, text);
        assert_eq!(chunks, 3);
    }

    #[tokio::test]
    async fn chunked_stream_of_empty_text_is_empty() {
        let mut stream = chunked_stream(String::new());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn chunked_stream_respects_char_boundaries() {
        let text = "é".repeat(121);
        let mut stream = chunked_stream(text.clone());
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.chars().count(), 120);
    }
}
