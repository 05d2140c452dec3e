// SPDX-License-Identifier: MIT OR Apache-2.0
//! The durable queue file: a JSON array of items with atomic replace.
//!
//! Cross-process coordination is optimistic: writers reload the file under
//! the in-process lock and reapply only their own per-item mutations, matched
//! by `qid`, before renaming the replacement into place. An item appended by
//! the other process between read and write therefore survives.

use crate::{ActionSpec, ApprovedBy, QueueError, QueueItem, QueueStatus};
use chrono::Utc;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// A token stamp produced by an approval pass, applied by `qid`.
#[derive(Debug, Clone)]
pub struct ApprovalStamp {
    /// Target item.
    pub qid: String,
    /// The minted token.
    pub token: String,
    /// Who minted it.
    pub approved_by: ApprovedBy,
    /// When it was minted, ISO-8601 UTC.
    pub approved_at: String,
    /// The fingerprint the token binds.
    pub spec_hash: String,
}

/// A terminal transition produced by an executor pass, applied by `qid`.
#[derive(Debug, Clone)]
pub struct Finish {
    /// Target item.
    pub qid: String,
    /// Terminal status to apply.
    pub status: QueueStatus,
    /// Reason, when there is one.
    pub reason: Option<String>,
}

/// Handle on one per-domain queue file.
///
/// Writes within a process are serialized by the internal mutex; share the
/// store behind an `Arc` when several components touch the same file.
#[derive(Debug)]
pub struct QueueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl QueueStore {
    /// A store over the queue file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// The queue file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all items.
    ///
    /// A missing file is an empty queue. A present-but-unparsable file is
    /// [`QueueError::Corrupt`]; callers treat it as empty for the pass and
    /// must not write the file back.
    pub fn load(&self) -> Result<Vec<QueueItem>, QueueError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(QueueError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        match serde_json::from_str::<Option<Vec<QueueItem>>>(&raw) {
            Ok(items) => Ok(items.unwrap_or_default()),
            Err(e) => Err(QueueError::Corrupt {
                path: self.path.clone(),
                detail: e.to_string(),
            }),
        }
    }

    /// Load, downgrading corruption to an empty queue with a warning.
    pub fn load_or_empty(&self) -> Vec<QueueItem> {
        match self.load() {
            Ok(items) => items,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "queue unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    /// Whether an item with this `qid` exists.
    pub fn contains(&self, qid: &str) -> Result<bool, QueueError> {
        Ok(self.load()?.iter().any(|it| it.qid == qid))
    }

    /// Append a fresh item, unless its `qid` is already present.
    ///
    /// Returns `true` when the item was appended, `false` when an item with
    /// the same `qid` already exists (the queue is left untouched).
    pub fn append(&self, item: QueueItem) -> Result<bool, QueueError> {
        let _guard = self.lock.lock().expect("queue lock poisoned");
        let mut items = self.load()?;
        if items.iter().any(|it| it.qid == item.qid) {
            return Ok(false);
        }
        items.push(item);
        self.replace(&items)?;
        Ok(true)
    }

    /// Apply approval stamps to reloaded items matched by `qid`.
    ///
    /// A stamp lands only on an item that is still pending with no token, so
    /// a concurrent terminal transition or earlier approval wins. Returns the
    /// number of stamps applied.
    pub fn stamp_approvals(&self, stamps: &[ApprovalStamp]) -> Result<usize, QueueError> {
        if stamps.is_empty() {
            return Ok(0);
        }
        let _guard = self.lock.lock().expect("queue lock poisoned");
        let mut items = self.load()?;
        let mut applied = 0;
        for stamp in stamps {
            if let Some(item) = items
                .iter_mut()
                .find(|it| it.qid == stamp.qid && it.is_pending() && it.approval_token.is_none())
            {
                item.approval_token = Some(stamp.token.clone());
                item.approved_by = Some(stamp.approved_by);
                item.approved_at = Some(stamp.approved_at.clone());
                item.spec_hash = Some(stamp.spec_hash.clone());
                applied += 1;
            }
        }
        if applied > 0 {
            self.replace(&items)?;
        }
        Ok(applied)
    }

    /// Apply terminal transitions to reloaded items matched by `qid`.
    ///
    /// Only pending items transition; terminal items are never resurrected.
    /// Returns the number of transitions applied.
    pub fn finish_items(&self, finishes: &[Finish]) -> Result<usize, QueueError> {
        if finishes.is_empty() {
            return Ok(0);
        }
        let _guard = self.lock.lock().expect("queue lock poisoned");
        let mut items = self.load()?;
        let mut applied = 0;
        for finish in finishes {
            if let Some(item) = items
                .iter_mut()
                .find(|it| it.qid == finish.qid && it.is_pending())
            {
                item.finish(finish.status, finish.reason.clone());
                applied += 1;
            }
        }
        if applied > 0 {
            self.replace(&items)?;
        }
        Ok(applied)
    }

    /// Manually approve a pending item: mint a token under `secret` with the
    /// given TTL, bound to the item's current fingerprint.
    ///
    /// Returns `false` when no pending item with this `qid` exists.
    pub fn approve_manual(
        &self,
        qid: &str,
        secret: &[u8],
        ttl_s: i64,
    ) -> Result<bool, QueueError> {
        let _guard = self.lock.lock().expect("queue lock poisoned");
        let mut items = self.load()?;
        let Some(item) = items.iter_mut().find(|it| it.qid == qid && it.is_pending()) else {
            return Ok(false);
        };

        let hash = match &item.spec_hash {
            Some(h) => h.clone(),
            None => ActionSpec::from_item(item)?.hash()?,
        };
        let token = steward_token::mint(
            secret,
            item.action.token_type(),
            ttl_s,
            steward_token::bind_queue_item(&item.qid, &hash),
        )?;
        item.approval_token = Some(token);
        item.approved_by = Some(ApprovedBy::Manual);
        item.approved_at = Some(Utc::now().to_rfc3339());
        item.spec_hash = Some(hash);

        self.replace(&items)?;
        Ok(true)
    }

    /// Replace a pending item's spec: store the new wire form, recompute the
    /// fingerprint, clear the token fields, keep the item pending.
    ///
    /// Returns `false` when no pending item with this `qid` exists.
    pub fn edit_spec(&self, qid: &str, new_spec: &ActionSpec) -> Result<bool, QueueError> {
        let _guard = self.lock.lock().expect("queue lock poisoned");
        let mut items = self.load()?;
        let Some(item) = items.iter_mut().find(|it| it.qid == qid && it.is_pending()) else {
            return Ok(false);
        };

        item.spec = new_spec.to_value()?;
        item.spec_hash = Some(new_spec.hash()?);
        item.clear_approval();

        self.replace(&items)?;
        Ok(true)
    }

    /// Atomically replace the queue file: uniquely-named temp file in the
    /// same directory, write, fsync, rename over the target, fsync parent.
    fn replace(&self, items: &[QueueItem]) -> Result<(), QueueError> {
        let parent = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&parent).map_err(|source| QueueError::Io {
            path: self.path.clone(),
            source,
        })?;

        let data =
            serde_json::to_vec_pretty(items).map_err(steward_core::ContractError::from)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".tmp_")
            .tempfile_in(&parent)
            .map_err(|source| QueueError::Io {
                path: self.path.clone(),
                source,
            })?;
        tmp.write_all(&data).map_err(|source| QueueError::Io {
            path: self.path.clone(),
            source,
        })?;
        tmp.as_file().sync_all().map_err(|source| QueueError::Io {
            path: self.path.clone(),
            source,
        })?;
        tmp.persist(&self.path).map_err(|e| QueueError::Io {
            path: self.path.clone(),
            source: e.error,
        })?;

        fsync_parent_dir(&self.path);
        Ok(())
    }
}

/// Best-effort fsync of the parent directory after a rename, making the
/// directory entry update durable on crash. Not all platforms support
/// opening a directory for sync, so errors are ignored.
fn fsync_parent_dir(path: &Path) {
    if let Some(parent) = path.parent()
        && let Ok(dir) = std::fs::File::open(parent)
    {
        let _ = dir.sync_all();
    }
}
