// SPDX-License-Identifier: MIT OR Apache-2.0
//! Anthropic provider: the `/v1/messages` endpoint.

use super::{COMPLETE_TIMEOUT, maybe_parse_json, read_json_response};
use crate::{Llm, LlmError, LlmResponse, TextStream, chunked_stream};
use async_trait::async_trait;
use serde_json::json;

/// API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Upper bound on generated tokens per call.
const MAX_TOKENS: u32 = 800;

/// Client for the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicHttp {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl AnthropicHttp {
    /// Connect with an API key, a base URL, and a model name.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

#[async_trait]
impl Llm for AnthropicHttp {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<LlmResponse, LlmError> {
        let payload = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": system,
            "messages": [{"role": "user", "content": user}],
        });
        let resp = self
            .client
            .post(self.messages_url())
            .timeout(COMPLETE_TIMEOUT)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await?;
        let data = read_json_response(resp).await?;

        let mut text = String::new();
        for block in data["content"].as_array().into_iter().flatten() {
            if block["type"] == "text"
                && let Some(piece) = block["text"].as_str()
            {
                text.push_str(piece);
            }
        }
        let text = text.trim().to_string();
        Ok(LlmResponse {
            json: maybe_parse_json(json_mode, &text),
            text,
            model: self.model.clone(),
            usage: data.get("usage").cloned(),
        })
    }

    async fn stream(&self, system: &str, user: &str) -> Result<TextStream, LlmError> {
        // No native streaming here; generate once and re-emit in chunks.
        let resp = self.complete(system, user, false).await?;
        Ok(chunked_stream(resp.text))
    }
}
