// SPDX-License-Identifier: MIT OR Apache-2.0
//! The messages scheduler.
//!
//! Heuristic by default; with an LLM configured it proposes from a strict
//! JSON schema over sanitized thread summaries and falls back to the
//! heuristic on any transport, parse, or validation failure.

use super::MAX_INTENTS_PER_TICK;
use crate::state::ThreadSummary;
use serde_json::json;
use std::sync::Arc;
use steward_core::{Domain, Intent};
use steward_llm::prompts::{system_messages_scheduler, user_messages_scheduler};
use steward_llm::{Llm, parse_intent_batch, sanitize_untrusted_text};
use tracing::debug;

/// Cap on threads shown to the model.
const MAX_THREADS_FOR_LLM: usize = 20;

/// Proposes `draft_reply` intents over inbox threads.
pub struct MessagesScheduler<'a> {
    threads: &'a [ThreadSummary],
    llm: Option<Arc<dyn Llm>>,
}

impl<'a> MessagesScheduler<'a> {
    /// A scheduler over the tick's inbox state.
    pub fn new(threads: &'a [ThreadSummary], llm: Option<Arc<dyn Llm>>) -> Self {
        Self { threads, llm }
    }

    /// Propose candidate intents for this tick.
    pub async fn propose(&self) -> Vec<Intent> {
        let Some(llm) = &self.llm else {
            return self.fallback();
        };

        let safe_threads: Vec<serde_json::Value> = self
            .threads
            .iter()
            .take(MAX_THREADS_FOR_LLM)
            .map(|th| {
                json!({
                    "thread_id": th.thread_id,
                    "message_id": th.message_id,
                    "from": sanitize_untrusted_text(&th.from, 200),
                    "subject": sanitize_untrusted_text(&th.subject, 200),
                    "snippet": sanitize_untrusted_text(&th.snippet, 800),
                    "unread": th.unread,
                    "important": th.important,
                })
            })
            .collect();
        let threads_json = match serde_json::to_string(&safe_threads) {
            Ok(s) => s,
            Err(_) => return self.fallback(),
        };

        let resp = match llm
            .complete(
                system_messages_scheduler(),
                &user_messages_scheduler(&threads_json),
                true,
            )
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                debug!(error = %e, "llm proposal failed, using heuristic");
                return self.fallback();
            }
        };
        let Some(batch_json) = resp.json else {
            return self.fallback();
        };

        match parse_intent_batch(&batch_json) {
            Ok(mut intents) => {
                intents.truncate(MAX_INTENTS_PER_TICK);
                intents
            }
            Err(e) => {
                debug!(error = %e, "llm proposal failed validation, using heuristic");
                self.fallback()
            }
        }
    }

    /// One `draft_reply` per thread: unread raises urgency, importance
    /// raises value.
    fn fallback(&self) -> Vec<Intent> {
        self.threads
            .iter()
            .take(MAX_INTENTS_PER_TICK)
            .map(|th| {
                let urgency = if th.unread { 0.8 } else { 0.4 };
                let value = if th.important { 0.7 } else { 0.4 };
                Intent::new(Domain::Messages, "draft_reply")
                    .with_scores(value, urgency, 60)
                    .with_payload("thread_id", th.thread_id.clone())
                    .with_payload("message_id", th.message_id.clone())
                    .with_payload("subject", th.subject.clone())
                    .with_payload("snippet", th.snippet.clone())
                    .with_payload("from", th.from.clone())
                    .with_preconditions(vec!["has_inbox_data".to_string()])
            })
            .collect()
    }
}
