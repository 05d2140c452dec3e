// SPDX-License-Identifier: MIT OR Apache-2.0
//! The executor poll loop and its per-item state machine.
//!
//! ```text
//! pending (token!=null) --verify fail|mismatch--> rejected [terminal]
//! pending (token!=null) --writer ok-->            done     [terminal]
//! pending (token!=null) --writer err-->           error    [terminal]
//! ```
//!
//! Terminal `qid`s land in the dedupe store and are ignored forever after,
//! even if a later queue load somehow shows them pending again.

use crate::writers::ActionWriter;
use crate::ExecError;
use anyhow::{Context, bail};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use steward_ledger::{Ledger, LedgerRecord};
use steward_queue::{
    ActionSpec, DedupeStore, Finish, QueueError, QueueItem, QueueStatus, QueueStore,
};
use steward_token::unix_now;
use tracing::{info, warn};

/// Default cadence of the poll loop.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Cap on writer error messages stored in the queue and ledger.
const MAX_REASON_CHARS: usize = 300;

/// The queues one pass walks, in order.
const QUEUE_FILES: &[&str] = &[
    "messages/send_queue.json",
    "calendar/event_queue.json",
    "forum/post_queue.json",
];

/// Counts from one executor pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Items executed successfully.
    pub executed: usize,
    /// Items rejected for token problems.
    pub rejected: usize,
    /// Items whose writer failed.
    pub errored: usize,
}

/// The executor daemon.
pub struct ExecutorDaemon {
    artifacts_dir: PathBuf,
    secret: Vec<u8>,
    writer: Arc<dyn ActionWriter>,
    ledger: Ledger,
    poll_interval: Duration,
}

impl ExecutorDaemon {
    /// Build a daemon over `artifacts_dir`.
    ///
    /// # Errors
    ///
    /// [`ExecError::EmptySecret`] when `secret` is empty; startup must abort
    /// rather than run an executor that cannot verify anything.
    pub fn new(
        artifacts_dir: impl Into<PathBuf>,
        secret: impl Into<Vec<u8>>,
        writer: Arc<dyn ActionWriter>,
    ) -> Result<Self, ExecError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ExecError::EmptySecret);
        }
        let artifacts_dir = artifacts_dir.into();
        Ok(Self {
            ledger: Ledger::new(artifacts_dir.join("ledger.jsonl")),
            artifacts_dir,
            secret,
            writer,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// Override the poll cadence.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Poll forever. Pass-level failures are logged and retried on the next
    /// iteration; per-item outcomes are terminal by design.
    pub async fn run(&self) {
        info!(artifacts = %self.artifacts_dir.display(), "executor daemon started");
        loop {
            match self.run_once().await {
                Ok(summary) if summary != PassSummary::default() => {
                    info!(
                        executed = summary.executed,
                        rejected = summary.rejected,
                        errored = summary.errored,
                        "executor pass finished"
                    );
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "executor pass failed"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// One pass over all queues: verify, execute, record.
    pub async fn run_once(&self) -> Result<PassSummary, ExecError> {
        let mut dedupe = DedupeStore::load(self.artifacts_dir.join(".exec_executed.json"));
        let mut summary = PassSummary::default();

        for rel in QUEUE_FILES {
            let store = QueueStore::new(self.artifacts_dir.join(rel));
            self.process_queue(&store, &mut dedupe, &mut summary).await?;
        }

        dedupe.persist()?;
        Ok(summary)
    }

    async fn process_queue(
        &self,
        store: &QueueStore,
        dedupe: &mut DedupeStore,
        summary: &mut PassSummary,
    ) -> Result<(), ExecError> {
        let items = match store.load() {
            Ok(items) => items,
            Err(QueueError::Corrupt { path, detail }) => {
                self.ledger.append(
                    &LedgerRecord::new("queue_read_error")
                        .field("path", path.display().to_string())
                        .field("detail", detail),
                )?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let mut finishes: Vec<Finish> = Vec::new();
        for item in &items {
            if item.qid.is_empty() || dedupe.contains(&item.qid) || !item.is_pending() {
                continue;
            }
            let Some(token) = item.approval_token.as_deref() else {
                continue;
            };

            if let Some(reason) = self.refuse_token(item, token) {
                finishes.push(self.reject(item, reason, dedupe)?);
                summary.rejected += 1;
                continue;
            }

            let action = item.action.token_type();
            match self.dispatch(item).await {
                Ok(()) => {
                    dedupe.record(&item.qid, QueueStatus::Done);
                    self.ledger.append(
                        &LedgerRecord::new("exec_ok")
                            .field("qid", item.qid.clone())
                            .field("action", action),
                    )?;
                    finishes.push(Finish {
                        qid: item.qid.clone(),
                        status: QueueStatus::Done,
                        reason: None,
                    });
                    summary.executed += 1;
                }
                Err(e) => {
                    let reason: String = format!("{e:#}").chars().take(MAX_REASON_CHARS).collect();
                    dedupe.record(&item.qid, QueueStatus::Error);
                    self.ledger.append(
                        &LedgerRecord::new("exec_error")
                            .field("qid", item.qid.clone())
                            .field("action", action)
                            .field("err", reason.clone()),
                    )?;
                    finishes.push(Finish {
                        qid: item.qid.clone(),
                        status: QueueStatus::Error,
                        reason: Some(reason),
                    });
                    summary.errored += 1;
                }
            }
        }

        store.finish_items(&finishes)?;
        Ok(())
    }

    /// Why this token must be refused, or `None` when it is good.
    ///
    /// Signature, expiry, and action binding first; then the `(qid,
    /// spec_hash)` binding against the item itself.
    fn refuse_token(&self, item: &QueueItem, token: &str) -> Option<&'static str> {
        let Some(approval) = steward_token::verify(&self.secret, token) else {
            return Some("invalid_or_expired_token");
        };
        if approval.expired_at(unix_now()) {
            return Some("invalid_or_expired_token");
        }
        if approval.token_type != item.action.token_type() {
            return Some("invalid_or_expired_token");
        }

        let item_hash = item.spec_hash.as_deref().unwrap_or("");
        if approval.bind_str("qid") != item.qid || approval.bind_str("spec_hash") != item_hash {
            return Some("token_bind_mismatch");
        }
        None
    }

    fn reject(
        &self,
        item: &QueueItem,
        reason: &'static str,
        dedupe: &mut DedupeStore,
    ) -> Result<Finish, ExecError> {
        dedupe.record(&item.qid, QueueStatus::Rejected);
        self.ledger.append(
            &LedgerRecord::new("exec_reject")
                .field("qid", item.qid.clone())
                .field("reason", reason),
        )?;
        Ok(Finish {
            qid: item.qid.clone(),
            status: QueueStatus::Rejected,
            reason: Some(reason.to_string()),
        })
    }

    /// Resolve the spec and perform the external action.
    async fn dispatch(&self, item: &QueueItem) -> anyhow::Result<()> {
        let spec = ActionSpec::from_item(item).context("reconstruct spec")?;
        match spec {
            ActionSpec::SendEmail(s) => {
                if s.to.is_empty() {
                    bail!("spec.to is empty; fill recipient email before approval");
                }
                let body = std::fs::read_to_string(&s.body_md_path)
                    .with_context(|| format!("read body {}", s.body_md_path))?;
                self.writer.send_email(&s.to, &s.subject, &body).await
            }
            ActionSpec::CreateEvent(s) => {
                let description = std::fs::read_to_string(&s.description_md_path)
                    .with_context(|| format!("read description {}", s.description_md_path))?;
                self.writer
                    .create_event(
                        &s.calendar_id,
                        &s.title,
                        &s.start_iso,
                        &s.end_iso,
                        &description,
                        &s.attendees,
                    )
                    .await
            }
            ActionSpec::CreatePost(s) => {
                let body = std::fs::read_to_string(&s.body_md_path)
                    .with_context(|| format!("read body {}", s.body_md_path))?;
                self.writer.create_post(&s.title, &body).await
            }
            ActionSpec::ReplyPost(s) => {
                let body = std::fs::read_to_string(&s.body_md_path)
                    .with_context(|| format!("read body {}", s.body_md_path))?;
                self.writer.reply_post(&s.post_id, &body).await
            }
        }
    }
}
