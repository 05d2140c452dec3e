// SPDX-License-Identifier: MIT OR Apache-2.0
//! The per-tick approval pass.
//!
//! Scans the send and calendar queues for pending, token-less items,
//! reconstructs each typed spec, asks the policy, and stamps a fresh token on
//! acceptance. Runs after every tick whether or not an intent was accepted,
//! and is idempotent: an item that already carries a token is never touched
//! again.

use crate::policy::{can_auto_approve_event, can_auto_approve_send};
use crate::ApproveError;
use chrono::Utc;
use std::path::Path;
use steward_config::Config;
use steward_ledger::{Ledger, LedgerRecord};
use steward_queue::{ActionSpec, ApprovalStamp, ApprovedBy, QueueError, QueueItem, QueueStore};
use tracing::{debug, info};

/// Run one approval pass over the artifact directory's queues.
///
/// Returns the number of tokens minted. Does nothing when auto-approval is
/// switched off or the secret is empty.
pub fn auto_approve_once(artifacts_dir: &Path, cfg: &Config) -> Result<usize, ApproveError> {
    if !cfg.auto_approve_armed() {
        return Ok(0);
    }

    let ledger = Ledger::new(artifacts_dir.join("ledger.jsonl"));
    let now_iso = Utc::now().to_rfc3339();
    let mut approvals = 0;

    let send_store = QueueStore::new(artifacts_dir.join("messages/send_queue.json"));
    approvals += approve_queue(&send_store, cfg, &ledger, &now_iso, |spec| match spec {
        ActionSpec::SendEmail(s) => can_auto_approve_send(s, cfg),
        _ => false,
    })?;

    let cal_store = QueueStore::new(artifacts_dir.join("calendar/event_queue.json"));
    approvals += approve_queue(&cal_store, cfg, &ledger, &now_iso, |spec| match spec {
        ActionSpec::CreateEvent(s) => can_auto_approve_event(s, cfg),
        _ => false,
    })?;

    if approvals > 0 {
        info!(approvals, "auto-approval pass minted tokens");
    }
    Ok(approvals)
}

fn approve_queue(
    store: &QueueStore,
    cfg: &Config,
    ledger: &Ledger,
    now_iso: &str,
    accepts: impl Fn(&ActionSpec) -> bool,
) -> Result<usize, ApproveError> {
    let items = match store.load() {
        Ok(items) => items,
        Err(QueueError::Corrupt { path, detail }) => {
            // Treat as empty for this pass; never write the file back.
            ledger.append(
                &LedgerRecord::new("queue_read_error")
                    .field("path", path.display().to_string())
                    .field("detail", detail),
            )?;
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };

    let mut stamps: Vec<ApprovalStamp> = Vec::new();
    for item in &items {
        if !item.is_pending() || item.approval_token.is_some() {
            continue;
        }
        let Some((spec, hash)) = reconstruct(item) else {
            debug!(qid = %item.qid, "skipping item with unreconstructable spec");
            continue;
        };
        if !accepts(&spec) {
            continue;
        }

        let token = steward_token::mint(
            cfg.exec_secret_bytes(),
            spec.kind().token_type(),
            cfg.auto_approve_ttl_s,
            steward_token::bind_queue_item(&item.qid, &hash),
        )?;
        ledger.append(
            &LedgerRecord::new("auto_approve")
                .field("qid", item.qid.clone())
                .field("action", spec.kind().as_str()),
        )?;
        stamps.push(ApprovalStamp {
            qid: item.qid.clone(),
            token,
            approved_by: ApprovedBy::Auto,
            approved_at: now_iso.to_string(),
            spec_hash: hash,
        });
    }

    if stamps.is_empty() {
        return Ok(0);
    }
    Ok(store.stamp_approvals(&stamps)?)
}

/// Rebuild the typed spec and pick the fingerprint: the stored one when
/// present, otherwise freshly computed (and stamped along with the token).
fn reconstruct(item: &QueueItem) -> Option<(ActionSpec, String)> {
    let spec = ActionSpec::from_item(item).ok()?;
    let hash = match &item.spec_hash {
        Some(h) if !h.is_empty() => h.clone(),
        _ => spec.hash().ok()?,
    };
    Some((spec, hash))
}
