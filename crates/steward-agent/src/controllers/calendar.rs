// SPDX-License-Identifier: MIT OR Apache-2.0
//! The calendar controller: agenda drafts and event enqueueing.

use super::write_draft;
use crate::AgentError;
use std::path::PathBuf;
use std::sync::Arc;
use steward_core::{ExecutionResult, Intent};
use steward_llm::{Llm, sanitize_untrusted_text};
use steward_queue::{ActionSpec, CreateEventSpec, QueueItem, QueueStore};
use uuid::Uuid;

/// Realizes `agenda_draft` and `enqueue_event_draft` intents.
pub struct CalendarController {
    artifacts_dir: PathBuf,
    #[allow(dead_code)]
    llm: Option<Arc<dyn Llm>>,
}

impl CalendarController {
    /// A controller writing under `artifacts_dir`.
    pub fn new(artifacts_dir: impl Into<PathBuf>, llm: Option<Arc<dyn Llm>>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            llm,
        }
    }

    /// Realize one accepted calendar intent.
    ///
    /// `agenda_draft` writes a draft file only; `enqueue_event_draft` writes
    /// the description draft and appends a pending `create_event` item.
    pub async fn execute(&self, intent: &Intent) -> Result<ExecutionResult, AgentError> {
        let drafts_dir = self.artifacts_dir.join("calendar/drafts");

        match intent.kind.as_str() {
            "agenda_draft" => {
                let eid = {
                    let e = intent.payload_str("event_id");
                    if e.is_empty() { "unknown" } else { e }.to_string()
                };
                let title = sanitize_untrusted_text(intent.payload_str("title"), 200);
                let when = sanitize_untrusted_text(intent.payload_str("when"), 200);
                let description = sanitize_untrusted_text(intent.payload_str("description"), 2000);

                let path = drafts_dir.join(format!("{eid}_agenda.md"));
                write_draft(
                    &path,
                    &format!("# Agenda Draft\n\nEvent: {title}\nWhen: {when}\n\n{description}\n"),
                )?;
                Ok(ExecutionResult::ok(vec![path], "agenda_draft_created"))
            }

            "enqueue_event_draft" => {
                let calendar_id = {
                    let c = intent.payload_str("calendar_id");
                    if c.is_empty() { "primary" } else { c }.to_string()
                };
                let title = sanitize_untrusted_text(intent.payload_str("title"), 200);
                let description = sanitize_untrusted_text(intent.payload_str("description"), 2000);
                let attendees: Vec<String> = intent
                    .payload
                    .get("attendees")
                    .and_then(|v| v.as_array())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|a| a.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default();

                let desc_path =
                    drafts_dir.join(format!("event_{}.md", Uuid::new_v4().simple()));
                write_draft(&desc_path, &description)?;

                let qid = format!("create_event_{}", Uuid::new_v4().simple());
                let spec = ActionSpec::CreateEvent(CreateEventSpec {
                    qid: qid.clone(),
                    calendar_id,
                    title,
                    start_iso: intent.payload_str("start_iso").to_string(),
                    end_iso: intent.payload_str("end_iso").to_string(),
                    description_md_path: desc_path.to_string_lossy().into_owned(),
                    attendees,
                });

                let store = QueueStore::new(self.artifacts_dir.join("calendar/event_queue.json"));
                store.append(QueueItem::pending(&spec)?)?;
                Ok(ExecutionResult::ok(
                    vec![desc_path, store.path().to_path_buf()],
                    "event_enqueued",
                ))
            }

            _ => Ok(ExecutionResult::skipped("unsupported_intent")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_core::Domain;

    #[tokio::test]
    async fn agenda_draft_writes_file_without_queue_entry() {
        let dir = tempfile::tempdir().unwrap();
        let ctrl = CalendarController::new(dir.path(), None);
        let intent = Intent::new(Domain::Calendar, "agenda_draft")
            .with_payload("event_id", "ev42")
            .with_payload("title", "Planning")
            .with_payload("when", "Tomorrow 10:00")
            .with_payload("description", "Quarterly planning session");

        let res = ctrl.execute(&intent).await.unwrap();
        assert_eq!(res.note, "agenda_draft_created");

        let draft =
            std::fs::read_to_string(dir.path().join("calendar/drafts/ev42_agenda.md")).unwrap();
        assert!(draft.contains("Event: Planning"));
        assert!(!dir.path().join("calendar/event_queue.json").exists());
    }

    #[tokio::test]
    async fn enqueue_event_draft_appends_pending_item() {
        let dir = tempfile::tempdir().unwrap();
        let ctrl = CalendarController::new(dir.path(), None);
        let intent = Intent::new(Domain::Calendar, "enqueue_event_draft")
            .with_payload("title", "Focus block")
            .with_payload("start_iso", "2026-08-10T10:00:00+02:00")
            .with_payload("end_iso", "2026-08-10T11:00:00+02:00")
            .with_payload("description", "Deep work");

        let res = ctrl.execute(&intent).await.unwrap();
        assert_eq!(res.note, "event_enqueued");

        let store = QueueStore::new(dir.path().join("calendar/event_queue.json"));
        let items = store.load().unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].qid.starts_with("create_event_"));
        match ActionSpec::from_item(&items[0]).unwrap() {
            ActionSpec::CreateEvent(spec) => {
                assert_eq!(spec.calendar_id, "primary");
                assert_eq!(spec.title, "Focus block");
                assert!(spec.attendees.is_empty());
                let desc = std::fs::read_to_string(&spec.description_md_path).unwrap();
                assert_eq!(desc, "Deep work");
            }
            other => panic!("expected CreateEvent, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn attendees_are_carried_through() {
        let dir = tempfile::tempdir().unwrap();
        let ctrl = CalendarController::new(dir.path(), None);
        let intent = Intent::new(Domain::Calendar, "enqueue_event_draft")
            .with_payload("title", "Sync")
            .with_payload(
                "attendees",
                serde_json::json!(["a@example.com", "b@example.com"]),
            );
        ctrl.execute(&intent).await.unwrap();

        let store = QueueStore::new(dir.path().join("calendar/event_queue.json"));
        let items = store.load().unwrap();
        match ActionSpec::from_item(&items[0]).unwrap() {
            ActionSpec::CreateEvent(spec) => {
                assert_eq!(spec.attendees, vec!["a@example.com", "b@example.com"]);
            }
            other => panic!("expected CreateEvent, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsupported_intent_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let ctrl = CalendarController::new(dir.path(), None);
        let res = ctrl
            .execute(&Intent::new(Domain::Calendar, "conflict_report"))
            .await
            .unwrap();
        assert_eq!(res.note, "unsupported_intent");
    }
}
