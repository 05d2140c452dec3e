// SPDX-License-Identifier: MIT OR Apache-2.0
//! The messages controller: draft a reply and enqueue the send.

use super::write_draft;
use crate::AgentError;
use std::path::PathBuf;
use std::sync::Arc;
use steward_core::{ExecutionResult, Intent};
use steward_llm::prompts::{system_draft_email, user_draft_email};
use steward_llm::{Llm, sanitize_untrusted_text};
use steward_queue::{ActionSpec, QueueItem, QueueStore, SendEmailSpec};
use tracing::debug;

/// Realizes `draft_reply` intents.
pub struct MessagesController {
    artifacts_dir: PathBuf,
    llm: Option<Arc<dyn Llm>>,
}

impl MessagesController {
    /// A controller writing under `artifacts_dir`.
    pub fn new(artifacts_dir: impl Into<PathBuf>, llm: Option<Arc<dyn Llm>>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            llm,
        }
    }

    /// Write the reply draft and append a pending `send_email` queue item.
    ///
    /// The recipient comes from the inbound `From:` header; when parsing
    /// yields nothing the `to` field stays empty, which both the
    /// auto-approval policy and the executor reject until a human fills it
    /// in.
    pub async fn execute(&self, intent: &Intent) -> Result<ExecutionResult, AgentError> {
        if intent.kind != "draft_reply" {
            return Ok(ExecutionResult::skipped("unsupported_intent"));
        }

        let tid = {
            let t = intent.payload_str("thread_id");
            if t.is_empty() { "unknown" } else { t }.to_string()
        };
        let subject = sanitize_untrusted_text(intent.payload_str("subject"), 200);
        let snippet = sanitize_untrusted_text(intent.payload_str("snippet"), 2000);

        let mut draft = String::new();
        if let Some(llm) = &self.llm {
            match llm
                .complete(system_draft_email(), &user_draft_email(&subject, &snippet), false)
                .await
            {
                Ok(resp) => draft = resp.text,
                Err(e) => debug!(error = %e, "draft generation failed, writing empty body"),
            }
        }

        let draft_path = self
            .artifacts_dir
            .join("messages/drafts")
            .join(format!("{tid}.md"));
        write_draft(
            &draft_path,
            &format!(
                "# Draft reply\n\nSubject: {subject}\n\nContext:\n{snippet}\n\n---\n\nDraft:\n\n{draft}\n"
            ),
        )?;

        let to = parse_reply_address(intent.payload_str("from"));
        let qid = format!("send_{tid}");
        let spec = ActionSpec::SendEmail(SendEmailSpec {
            qid: qid.clone(),
            thread_id: tid,
            to,
            subject,
            body_md_path: draft_path.to_string_lossy().into_owned(),
            reply_to_message_id: {
                let m = intent.payload_str("message_id");
                (!m.is_empty()).then(|| m.to_string())
            },
        });

        let store = QueueStore::new(self.artifacts_dir.join("messages/send_queue.json"));
        let appended = store.append(QueueItem::pending(&spec)?)?;
        let note = if appended {
            "draft_created_and_enqueued"
        } else {
            "draft_exists_skip_enqueue"
        };
        Ok(ExecutionResult::ok(
            vec![draft_path, store.path().to_path_buf()],
            note,
        ))
    }
}

/// Pull a bare address out of a `From:` header (`Name <addr>` or `addr`).
/// Empty when nothing address-shaped is present.
fn parse_reply_address(from: &str) -> String {
    let candidate = match (from.find('<'), from.rfind('>')) {
        (Some(open), Some(close)) if open < close => &from[open + 1..close],
        _ => from,
    };
    let candidate = candidate.trim();
    let looks_like_address = {
        let at = candidate.find('@');
        at.is_some_and(|i| i > 0 && i < candidate.len() - 1) && !candidate.contains(char::is_whitespace)
    };
    if looks_like_address {
        candidate.to_string()
    } else {
        String::new()
    }
}
