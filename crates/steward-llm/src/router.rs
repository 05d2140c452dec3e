// SPDX-License-Identifier: MIT OR Apache-2.0
//! Provider selection. The core never names a provider; it asks the router
//! for whatever the environment configures, and runs heuristics-only when
//! the answer is "nothing".

use crate::Llm;
use crate::providers::{AnthropicHttp, OllamaHttp, OpenAiHttp};
use std::sync::Arc;
use steward_config::Config;
use tracing::info;

/// Build the configured LLM, if any.
///
/// Selection comes from `Config::llm_provider` (`ollama` | `openai` |
/// `anthropic`); an empty or unknown provider, or a hosted provider with no
/// API key in the environment, yields `None` and the agent falls back to
/// heuristic scheduling.
pub fn build_llm(cfg: &Config) -> Option<Arc<dyn Llm>> {
    match cfg.llm_provider.as_str() {
        "" => None,
        "ollama" => {
            info!(model = %cfg.ollama_model, "using ollama provider");
            Some(Arc::new(OllamaHttp::new(
                cfg.ollama_base_url.clone(),
                cfg.ollama_model.clone(),
            )))
        }
        "openai" => {
            let api_key = std::env::var("OPENAI_API_KEY").ok()?;
            let base_url = std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string());
            let model =
                std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
            info!(%model, "using openai provider");
            Some(Arc::new(OpenAiHttp::new(api_key, base_url, model)))
        }
        "anthropic" => {
            let api_key = std::env::var("ANTHROPIC_API_KEY").ok()?;
            let base_url = std::env::var("ANTHROPIC_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string());
            let model = std::env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| "claude-3-5-sonnet-latest".to_string());
            info!(%model, "using anthropic provider");
            Some(Arc::new(AnthropicHttp::new(api_key, base_url, model)))
        }
        _ => None,
    }
}
