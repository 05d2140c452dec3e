// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ollama provider: local `/api/generate` endpoint, NDJSON streaming.

use super::{COMPLETE_TIMEOUT, STREAM_TIMEOUT, maybe_parse_json, read_json_response};
use crate::{Llm, LlmError, LlmResponse, TextStream};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

/// Client for an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaHttp {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaHttp {
    /// Connect to `base_url` (e.g. `http://localhost:11434`) using `model`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn prompt(system: &str, user: &str) -> String {
        format!("<<SYS>>\n{system}\n<</SYS>>\n\n{user}")
    }
}

#[async_trait]
impl Llm for OllamaHttp {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<LlmResponse, LlmError> {
        let payload = json!({
            "model": self.model,
            "prompt": Self::prompt(system, user),
            "stream": false,
        });
        let resp = self
            .client
            .post(self.generate_url())
            .timeout(COMPLETE_TIMEOUT)
            .json(&payload)
            .send()
            .await?;
        let data = read_json_response(resp).await?;

        let text = data["response"].as_str().unwrap_or("").trim().to_string();
        Ok(LlmResponse {
            json: maybe_parse_json(json_mode, &text),
            text,
            model: self.model.clone(),
            usage: None,
        })
    }

    async fn stream(&self, system: &str, user: &str) -> Result<TextStream, LlmError> {
        let payload = json!({
            "model": self.model,
            "prompt": Self::prompt(system, user),
            "stream": true,
        });
        let resp = self
            .client
            .post(self.generate_url())
            .timeout(STREAM_TIMEOUT)
            .json(&payload)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        // NDJSON: one {"response": "..."} object per line; lines may split
        // across transport chunks, so buffer until a newline lands.
        let (tx, rx) = mpsc::channel::<Result<String, LlmError>>(16);
        let mut bytes = resp.bytes_stream();
        tokio::spawn(async move {
            let mut buffer = String::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(LlmError::Transport(e))).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = buffer.find('\n') {
                    let line: String = buffer.drain(..=pos).collect();
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
                        debug!("skipping unparsable stream line");
                        continue;
                    };
                    if let Some(piece) = value["response"].as_str()
                        && !piece.is_empty()
                    {
                        if tx.send(Ok(piece.to_string())).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
