// SPDX-License-Identifier: MIT OR Apache-2.0
//! The forum controller: reply and post drafts, deduplicated by `qid`.
//!
//! Reply qids derive from the post id, so the same feed item seen on two
//! ticks enqueues exactly once.

use super::write_draft;
use crate::AgentError;
use std::path::PathBuf;
use std::sync::Arc;
use steward_core::{ExecutionResult, Intent};
use steward_llm::prompts::{
    system_forum_post, system_forum_reply, user_forum_post, user_forum_reply,
};
use steward_llm::{Llm, sanitize_untrusted_text};
use steward_queue::{ActionSpec, CreatePostSpec, QueueItem, QueueStore, ReplyPostSpec};
use tracing::debug;
use uuid::Uuid;

/// Realizes `draft_forum_reply` and `draft_forum_post` intents.
pub struct ForumController {
    artifacts_dir: PathBuf,
    llm: Option<Arc<dyn Llm>>,
}

impl ForumController {
    /// A controller writing under `artifacts_dir`.
    pub fn new(artifacts_dir: impl Into<PathBuf>, llm: Option<Arc<dyn Llm>>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            llm,
        }
    }

    fn queue(&self) -> QueueStore {
        QueueStore::new(self.artifacts_dir.join("forum/post_queue.json"))
    }

    async fn generate(&self, system: &str, user: &str) -> String {
        let Some(llm) = &self.llm else {
            return String::new();
        };
        match llm.complete(system, user, false).await {
            Ok(resp) => resp.text,
            Err(e) => {
                debug!(error = %e, "forum draft generation failed, writing empty body");
                String::new()
            }
        }
    }

    /// Realize one accepted forum intent.
    pub async fn execute(&self, intent: &Intent) -> Result<ExecutionResult, AgentError> {
        let drafts_dir = self.artifacts_dir.join("forum/drafts");

        match intent.kind.as_str() {
            "draft_forum_reply" => {
                let post_id = sanitize_untrusted_text(intent.payload_str("post_id"), 200);
                let title = sanitize_untrusted_text(intent.payload_str("title"), 200);
                let content = sanitize_untrusted_text(intent.payload_str("content"), 4000);

                let safe_post_id = safe_id(&post_id);
                let qid = format!("molt_reply_{safe_post_id}");
                let store = self.queue();
                if store.contains(&qid)? {
                    return Ok(ExecutionResult::ok(
                        vec![store.path().to_path_buf()],
                        "draft_exists_skip_enqueue",
                    ));
                }

                let draft = self
                    .generate(system_forum_reply(), &user_forum_reply(&title, &content))
                    .await;
                let path = drafts_dir.join(format!("reply_{safe_post_id}.md"));
                write_draft(
                    &path,
                    &format!(
                        "# Forum Reply Draft\n\nPost: {title}\n\nContext:\n{content}\n\n---\n\nDraft:\n\n{draft}\n"
                    ),
                )?;

                let spec = ActionSpec::ReplyPost(ReplyPostSpec {
                    qid: qid.clone(),
                    post_id,
                    body_md_path: path.to_string_lossy().into_owned(),
                });
                store.append(QueueItem::pending(&spec)?)?;
                Ok(ExecutionResult::ok(
                    vec![path, store.path().to_path_buf()],
                    "reply_draft_created_and_enqueued",
                ))
            }

            "draft_forum_post" => {
                let title = sanitize_untrusted_text(intent.payload_str("title"), 200);
                let context = sanitize_untrusted_text(intent.payload_str("context"), 4000);

                let draft = self
                    .generate(system_forum_post(), &user_forum_post(&title, &context))
                    .await;
                let path = drafts_dir.join(format!("post_{}.md", Uuid::new_v4().simple()));
                write_draft(
                    &path,
                    &format!(
                        "# Forum Post Draft\n\nTitle: {title}\n\nContext:\n{context}\n\n---\n\nDraft:\n\n{draft}\n"
                    ),
                )?;

                let qid = format!("molt_post_{}", Uuid::new_v4().simple());
                let spec = ActionSpec::CreatePost(CreatePostSpec {
                    qid: qid.clone(),
                    title,
                    body_md_path: path.to_string_lossy().into_owned(),
                });
                let store = self.queue();
                store.append(QueueItem::pending(&spec)?)?;
                Ok(ExecutionResult::ok(
                    vec![path, store.path().to_path_buf()],
                    "post_draft_created_and_enqueued",
                ))
            }

            _ => Ok(ExecutionResult::skipped("unsupported_intent")),
        }
    }
}

/// Collapse a raw post id to `[A-Za-z0-9_-]`, capped at 64 characters.
/// An id with nothing salvageable gets a random hex name instead.
fn safe_id(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(64)
        .collect();
    if kept.is_empty() {
        Uuid::new_v4().simple().to_string()
    } else {
        kept
    }
}
