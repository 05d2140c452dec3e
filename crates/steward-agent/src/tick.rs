// SPDX-License-Identifier: MIT OR Apache-2.0
//! The tick loop: gather state, propose, gate, arbitrate, realize, approve.
//!
//! One tick admits at most one intent. Whatever happens, the auto-approval
//! engine runs at the end of the tick, so queue items from earlier ticks
//! (or from the other process) still get their pass.

use crate::controllers::{
    CalendarController, CodingController, ForumController, MessagesController,
};
use crate::schedulers::{CalendarScheduler, CodingScheduler, ForumScheduler, MessagesScheduler};
use crate::state::TickInputs;
use crate::AgentError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use steward_approve::auto_approve_once;
use steward_config::Config;
use steward_core::{Domain, Gate, GlobalArbiter};
use steward_ledger::{Ledger, LedgerRecord};
use steward_llm::Llm;
use tracing::{info, warn};

/// Supplies the tick's input state. Reader adapters live behind this seam;
/// a reader failure must surface as an empty bundle, not an error.
#[async_trait]
pub trait StateProvider: Send + Sync {
    /// Gather the input state for one tick.
    async fn gather(&self) -> TickInputs;
}

/// A provider with nothing to report; every scheduler sees empty state.
pub struct EmptyStateProvider;

#[async_trait]
impl StateProvider for EmptyStateProvider {
    async fn gather(&self) -> TickInputs {
        TickInputs::default()
    }
}

/// The orchestrator: owns the gate, the arbiter, the ledger, and the four
/// controllers, and drives N ticks over them.
pub struct Orchestrator {
    artifacts_dir: PathBuf,
    cfg: Config,
    llm: Option<Arc<dyn Llm>>,
    gate: Gate,
    arbiter: GlobalArbiter,
    ledger: Ledger,
    messages: MessagesController,
    calendar: CalendarController,
    coding: CodingController,
    forum: ForumController,
}

impl Orchestrator {
    /// Build an orchestrator over `artifacts_dir`.
    pub fn new(
        artifacts_dir: impl Into<PathBuf>,
        cfg: Config,
        llm: Option<Arc<dyn Llm>>,
    ) -> Self {
        let artifacts_dir = artifacts_dir.into();
        Self {
            ledger: Ledger::new(artifacts_dir.join("ledger.jsonl")),
            messages: MessagesController::new(&artifacts_dir, llm.clone()),
            calendar: CalendarController::new(&artifacts_dir, llm.clone()),
            coding: CodingController::new(&artifacts_dir),
            forum: ForumController::new(&artifacts_dir, llm.clone()),
            gate: Gate::new(),
            arbiter: GlobalArbiter,
            artifacts_dir,
            cfg,
            llm,
        }
    }

    /// Run `ticks` ticks, sleeping briefly between them. A failed tick is
    /// logged and the loop moves on; the next tick retries naturally.
    pub async fn run_ticks(&self, ticks: u32, provider: &dyn StateProvider) {
        for t in 0..ticks {
            let inputs = provider.gather().await;
            if let Err(e) = self.tick(t, &inputs).await {
                warn!(tick = t, error = %e, "tick failed");
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Run exactly one tick over the given inputs.
    pub async fn tick(&self, t: u32, inputs: &TickInputs) -> Result<(), AgentError> {
        let mut intents = MessagesScheduler::new(&inputs.threads, self.llm.clone())
            .propose()
            .await;
        intents.extend(CalendarScheduler::new(&inputs.events).propose());
        intents.extend(CodingScheduler::new(&inputs.repos).propose());
        intents.extend(ForumScheduler::new(&inputs.posts).propose());

        let Some(chosen) = self.arbiter.choose(&intents).cloned() else {
            self.ledger.append(
                &LedgerRecord::new("tick")
                    .field("tick", t)
                    .field("note", "no_intents"),
            )?;
            auto_approve_once(&self.artifacts_dir, &self.cfg)?;
            return Ok(());
        };

        let decision = self.gate.decide(chosen);
        self.ledger.append(
            &LedgerRecord::new("decision")
                .field("tick", t)
                .field("accepted", decision.accepted)
                .field("reason", decision.reason.clone())
                .field(
                    "intent",
                    serde_json::to_value(&decision.intent).unwrap_or_default(),
                ),
        )?;

        if !decision.accepted {
            auto_approve_once(&self.artifacts_dir, &self.cfg)?;
            return Ok(());
        }

        let intent = decision.intent;
        info!(tick = t, domain = %intent.domain, kind = %intent.kind, "executing intent");
        let result = match intent.domain {
            Domain::Messages => self.messages.execute(&intent).await?,
            Domain::Calendar => self.calendar.execute(&intent).await?,
            Domain::Coding => self.coding.execute(&intent).await?,
            Domain::Forum => self.forum.execute(&intent).await?,
        };

        let artifacts: Vec<String> = result
            .artifacts
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        self.ledger.append(
            &LedgerRecord::new("exec")
                .field("tick", t)
                .field("status", result.status.to_string())
                .field("note", result.note)
                .field("artifacts", serde_json::json!(artifacts)),
        )?;

        auto_approve_once(&self.artifacts_dir, &self.cfg)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ThreadSummary;
    use steward_queue::{ApprovedBy, QueueStore};

    fn armed_cfg() -> Config {
        Config {
            exec_secret: "secret".to_string(),
            auto_approve: true,
            self_email: "me@example.com".to_string(),
            ..Config::default()
        }
    }

    fn read_ledger(dir: &std::path::Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(dir.join("ledger.jsonl"))
            .unwrap_or_default()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn empty_tick_records_no_intents_in_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let orch = Orchestrator::new(dir.path(), Config::default(), None);

        orch.tick(0, &TickInputs::default()).await.unwrap();

        let records = read_ledger(dir.path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["kind"], "tick");
        assert_eq!(records[0]["note"], "no_intents");
    }

    #[tokio::test]
    async fn inbox_thread_flows_to_tokenized_queue_item() {
        let dir = tempfile::tempdir().unwrap();
        let orch = Orchestrator::new(dir.path(), armed_cfg(), None);

        let inputs = TickInputs {
            threads: vec![ThreadSummary {
                thread_id: "t1".to_string(),
                message_id: "m1".to_string(),
                from: "Me <me@example.com>".to_string(),
                subject: "Note to self".to_string(),
                snippet: "remember the milk".to_string(),
                unread: true,
                important: false,
            }],
            ..TickInputs::default()
        };
        orch.tick(0, &inputs).await.unwrap();

        // Draft artifact exists.
        assert!(dir.path().join("messages/drafts/t1.md").exists());

        // Queue item was appended and auto-approved in the same tick.
        let store = QueueStore::new(dir.path().join("messages/send_queue.json"));
        let items = store.load().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].qid, "send_t1");
        assert_eq!(items[0].approved_by, Some(ApprovedBy::Auto));
        let token = items[0].approval_token.as_deref().unwrap();
        let appr = steward_token::verify(b"secret", token).unwrap();
        assert_eq!(appr.bind_str("qid"), "send_t1");

        // Ledger carries decision, exec, and auto_approve records.
        let kinds: Vec<String> = read_ledger(dir.path())
            .iter()
            .map(|r| r["kind"].as_str().unwrap().to_string())
            .collect();
        assert!(kinds.contains(&"decision".to_string()));
        assert!(kinds.contains(&"exec".to_string()));
        assert!(kinds.contains(&"auto_approve".to_string()));
    }

    #[tokio::test]
    async fn run_ticks_completes_all_requested_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let orch = Orchestrator::new(dir.path(), Config::default(), None);
        orch.run_ticks(3, &EmptyStateProvider).await;

        let records = read_ledger(dir.path());
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r["kind"] == "tick"));
    }

    #[tokio::test]
    async fn decision_record_embeds_the_intent() {
        let dir = tempfile::tempdir().unwrap();
        let orch = Orchestrator::new(dir.path(), Config::default(), None);
        let inputs = TickInputs {
            repos: vec![dir.path().to_string_lossy().into_owned()],
            ..TickInputs::default()
        };
        // run_tests against an empty dir will fail, but the decision and
        // exec records must land regardless.
        orch.tick(0, &inputs).await.unwrap();

        let records = read_ledger(dir.path());
        let decision = records.iter().find(|r| r["kind"] == "decision").unwrap();
        assert_eq!(decision["accepted"], true);
        assert_eq!(decision["reason"], "ok");
        assert_eq!(decision["intent"]["type"], "run_tests");
        assert!(records.iter().any(|r| r["kind"] == "exec"));
    }
}
