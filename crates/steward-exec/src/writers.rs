// SPDX-License-Identifier: MIT OR Apache-2.0
//! External writers: the only code in the system that performs a side
//! effect. The daemon hands a writer fully-resolved arguments (body text,
//! not paths); any error is caught there and recorded as a terminal `error`
//! on the item.

use crate::forum::ForumClient;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-request timeout for write calls.
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// The four external actions the executor can perform.
#[async_trait]
pub trait ActionWriter: Send + Sync {
    /// Send an email.
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()>;

    /// Insert a calendar event.
    async fn create_event(
        &self,
        calendar_id: &str,
        title: &str,
        start_iso: &str,
        end_iso: &str,
        description: &str,
        attendees: &[String],
    ) -> Result<()>;

    /// Publish a forum post.
    async fn create_post(&self, title: &str, body: &str) -> Result<()>;

    /// Publish a forum reply.
    async fn reply_post(&self, post_id: &str, body: &str) -> Result<()>;
}

/// Read an OAuth access token from a local token file: either a JSON object
/// with `access_token`/`token`, or the bare token string.
fn read_bearer_token(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read token file {}", path.display()))?;
    if let Ok(data) = serde_json::from_str::<serde_json::Value>(&raw) {
        if let Some(tok) = data["access_token"].as_str().or_else(|| data["token"].as_str()) {
            return Ok(tok.to_string());
        }
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("token file {} is empty", path.display());
    }
    Ok(trimmed.to_string())
}

async fn check_status(resp: reqwest::Response) -> Result<()> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!(
            "writer endpoint returned {status}: {}",
            body.chars().take(300).collect::<String>()
        );
    }
    Ok(())
}

/// Sends mail through the Gmail REST surface with a stored bearer token.
#[derive(Debug, Clone)]
pub struct GmailRestWriter {
    base_url: String,
    token_path: PathBuf,
    client: reqwest::Client,
}

impl GmailRestWriter {
    /// A writer using the token at `token_path`.
    pub fn new(base_url: impl Into<String>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_path: token_path.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Compose the RFC-822 message and send it as base64url raw content.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let token = read_bearer_token(&self.token_path)?;
        let mime = format!(
            "To: {to}\r\nSubject: {subject}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{body}"
        );
        let raw = URL_SAFE_NO_PAD.encode(mime.as_bytes());

        let resp = self
            .client
            .post(format!(
                "{}/gmail/v1/users/me/messages/send",
                self.base_url
            ))
            .timeout(WRITE_TIMEOUT)
            .bearer_auth(token)
            .json(&json!({"raw": raw}))
            .send()
            .await?;
        check_status(resp).await
    }
}

/// Inserts events through the Calendar REST surface with a stored bearer
/// token.
#[derive(Debug, Clone)]
pub struct CalendarRestWriter {
    base_url: String,
    token_path: PathBuf,
    client: reqwest::Client,
}

impl CalendarRestWriter {
    /// A writer using the token at `token_path`.
    pub fn new(base_url: impl Into<String>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_path: token_path.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Insert one event.
    pub async fn insert(
        &self,
        calendar_id: &str,
        title: &str,
        start_iso: &str,
        end_iso: &str,
        description: &str,
        attendees: &[String],
    ) -> Result<()> {
        let token = read_bearer_token(&self.token_path)?;
        let body = json!({
            "summary": title,
            "description": description,
            "start": {"dateTime": start_iso},
            "end": {"dateTime": end_iso},
            "attendees": attendees.iter().map(|a| json!({"email": a})).collect::<Vec<_>>(),
        });

        let resp = self
            .client
            .post(format!(
                "{}/calendar/v3/calendars/{calendar_id}/events",
                self.base_url
            ))
            .timeout(WRITE_TIMEOUT)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        check_status(resp).await
    }
}

/// The production writer set: Gmail-style mail, Calendar-style events, and
/// the forum client for posts and replies.
pub struct DefaultWriters {
    mail: GmailRestWriter,
    calendar: CalendarRestWriter,
    forum: ForumClient,
}

impl DefaultWriters {
    /// Compose the three concrete writers.
    pub fn new(mail: GmailRestWriter, calendar: CalendarRestWriter, forum: ForumClient) -> Self {
        Self {
            mail,
            calendar,
            forum,
        }
    }
}

#[async_trait]
impl ActionWriter for DefaultWriters {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.mail.send(to, subject, body).await
    }

    async fn create_event(
        &self,
        calendar_id: &str,
        title: &str,
        start_iso: &str,
        end_iso: &str,
        description: &str,
        attendees: &[String],
    ) -> Result<()> {
        self.calendar
            .insert(calendar_id, title, start_iso, end_iso, description, attendees)
            .await
    }

    async fn create_post(&self, title: &str, body: &str) -> Result<()> {
        self.forum.create_post(title, body).await.map(|_| ())
    }

    async fn reply_post(&self, post_id: &str, body: &str) -> Result<()> {
        self.forum.reply_post(post_id, body).await.map(|_| ())
    }
}
