// SPDX-License-Identifier: MIT OR Apache-2.0
//! Minimal forum API client.
//!
//! Credentials live in a local JSON file (`{"api_key": ..., "agent_name":
//! ...}`); every request carries the bearer key plus the agent name in both
//! `User-Agent` and `X-Agent-Name`. Shared by the feed reader on the
//! orchestrator side and the post/reply writers on the executor side.

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;

/// Per-request timeout for forum calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials for the forum API.
#[derive(Debug, Clone)]
pub struct ForumCredentials {
    /// Bearer key.
    pub api_key: String,
    /// Agent name advertised on every request.
    pub agent_name: String,
}

/// Load credentials from a JSON file, accepting both snake_case and
/// camelCase field names. `~` expands to the home directory.
pub fn load_credentials(path: &str) -> Result<ForumCredentials> {
    let expanded = expand_tilde(path);
    let raw = std::fs::read_to_string(&expanded)
        .with_context(|| format!("read forum credentials at {expanded}"))?;
    let data: Value = serde_json::from_str(&raw).context("parse forum credentials JSON")?;

    let api_key = data["api_key"]
        .as_str()
        .or_else(|| data["apiKey"].as_str())
        .unwrap_or("")
        .to_string();
    if api_key.is_empty() {
        bail!("missing api_key in forum credentials");
    }
    let agent_name = data["agent_name"]
        .as_str()
        .or_else(|| data["agentName"].as_str())
        .unwrap_or("steward")
        .to_string();
    Ok(ForumCredentials {
        api_key,
        agent_name,
    })
}

fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return format!("{home}/{rest}");
    }
    path.to_string()
}

/// HTTP client for one forum instance.
#[derive(Debug, Clone)]
pub struct ForumClient {
    base_url: String,
    credentials: ForumCredentials,
    client: reqwest::Client,
}

impl ForumClient {
    /// A client for `base_url` with the given credentials.
    pub fn new(base_url: impl Into<String>, credentials: ForumCredentials) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            client: reqwest::Client::new(),
        }
    }

    /// A client whose credentials are loaded from `credentials_path`.
    pub fn from_credentials_file(
        base_url: impl Into<String>,
        credentials_path: &str,
    ) -> Result<Self> {
        Ok(Self::new(base_url, load_credentials(credentials_path)?))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(&self.credentials.api_key)
            .header("User-Agent", &self.credentials.agent_name)
            .header("X-Agent-Name", &self.credentials.agent_name)
    }

    async fn read_checked(resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            bail!(
                "forum returned {status}: {}",
                body.chars().take(300).collect::<String>()
            );
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    /// Fetch the feed: a list of raw post objects.
    pub async fn list_posts(&self, sort: &str, limit: u32) -> Result<Vec<Value>> {
        let resp = self
            .request(
                reqwest::Method::GET,
                &format!("/posts?sort={sort}&limit={limit}"),
            )
            .send()
            .await?;
        let data = Self::read_checked(resp).await?;

        if let Some(posts) = data["posts"].as_array() {
            return Ok(posts.clone());
        }
        if let Value::Array(posts) = data {
            return Ok(posts);
        }
        Ok(Vec::new())
    }

    /// Fetch one post by id.
    pub async fn get_post(&self, post_id: &str) -> Result<Value> {
        let resp = self
            .request(reqwest::Method::GET, &format!("/posts/{post_id}"))
            .send()
            .await?;
        Self::read_checked(resp).await
    }

    /// Publish a new post.
    pub async fn create_post(&self, title: &str, content: &str) -> Result<Value> {
        let resp = self
            .request(reqwest::Method::POST, "/posts")
            .json(&json!({"title": title, "content": content}))
            .send()
            .await?;
        Self::read_checked(resp).await
    }

    /// Publish a reply under a post.
    pub async fn reply_post(&self, post_id: &str, content: &str) -> Result<Value> {
        let resp = self
            .request(reqwest::Method::POST, &format!("/posts/{post_id}/comments"))
            .json(&json!({"content": content}))
            .send()
            .await?;
        Self::read_checked(resp).await
    }
}
