// SPDX-License-Identifier: MIT OR Apache-2.0
//! Prompt texts. Everything is draft-only by construction; the model is
//! never asked to perform an action, only to write text or propose intents.

/// System prompt for the messages scheduler's structured proposal call.
pub fn system_messages_scheduler() -> &'static str {
    "Propose draft-only message intents. Return strict JSON only."
}

/// User prompt for the messages scheduler, over sanitized thread JSON.
pub fn user_messages_scheduler(threads_json: &str) -> String {
    format!(
        "Given inbox threads, propose 3-8 intents. \
         Allowed types: draft_reply, triage_summary, ask_clarifying_question. \
         Return JSON: {{\"intents\":[...]}}\n\nInbox threads:\n{threads_json}"
    )
}

/// System prompt for drafting an email reply body.
pub fn system_draft_email() -> &'static str {
    "Write a concise email draft. Draft-only. Return only the body."
}

/// User prompt for drafting an email reply body.
pub fn user_draft_email(subject: &str, context: &str) -> String {
    format!("Subject: {subject}\n\nContext:\n{context}\n\nWrite the draft reply body.")
}

/// System prompt for drafting a forum reply.
pub fn system_forum_reply() -> &'static str {
    "Write a concise forum comment reply. Draft-only. Return only the reply body."
}

/// User prompt for drafting a forum reply.
pub fn user_forum_reply(title: &str, content: &str) -> String {
    format!("Post title: {title}\n\nPost content:\n{content}\n\nWrite a helpful, concise reply.")
}

/// System prompt for drafting a forum post.
pub fn system_forum_post() -> &'static str {
    "Write a concise forum post. Draft-only. Return only the post body."
}

/// User prompt for drafting a forum post.
pub fn user_forum_post(title: &str, context: &str) -> String {
    format!("Post title: {title}\n\nContext:\n{context}\n\nWrite the post body.")
}
