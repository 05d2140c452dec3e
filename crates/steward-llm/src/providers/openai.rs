// SPDX-License-Identifier: MIT OR Apache-2.0
//! OpenAI provider: the `/v1/responses` endpoint.

use super::{COMPLETE_TIMEOUT, maybe_parse_json, read_json_response};
use crate::{Llm, LlmError, LlmResponse, TextStream, chunked_stream};
use async_trait::async_trait;
use serde_json::json;

/// Client for the OpenAI Responses API.
#[derive(Debug, Clone)]
pub struct OpenAiHttp {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiHttp {
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

    fn responses_url(&self) -> String {
        format!("{}/v1/responses", self.base_url)
    }
}

#[async_trait]
impl Llm for OpenAiHttp {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<LlmResponse, LlmError> {
        let mut payload = json!({
            "model": self.model,
            "input": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });
        if json_mode {
            payload["text"] = json!({"format": {"type": "json_object"}});
        }

        let resp = self
            .client
            .post(self.responses_url())
            .timeout(COMPLETE_TIMEOUT)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let data = read_json_response(resp).await?;

        let text = data["output_text"].as_str().unwrap_or("").trim().to_string();
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responses_url_is_under_v1() {
        let p = OpenAiHttp::new("k", "https://api.openai.com/", "gpt-4.1-mini");
        assert_eq!(p.responses_url(), "https://api.openai.com/v1/responses");
    }
}
