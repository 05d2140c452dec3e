// SPDX-License-Identifier: MIT OR Apache-2.0
//! The executor's dedupe store: terminal `qid`s that must never re-execute.
//!
//! A single JSON object mapping `qid` to its terminal status. Loaded at the
//! top of every executor iteration and persisted at the bottom, so a restart
//! (or a queue file that somehow reverts) cannot cause a second execution.

use crate::{QueueError, QueueStatus};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Persistent map of terminal `qid`s.
#[derive(Debug, Clone)]
pub struct DedupeStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl DedupeStore {
    /// Load the store at `path`. Missing or unreadable files start empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Option<BTreeMap<String, String>>>(&raw) {
                Ok(map) => map.unwrap_or_default(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "dedupe store unreadable, starting empty");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self { path, entries }
    }

    /// The store's file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this `qid` has already reached a terminal status.
    pub fn contains(&self, qid: &str) -> bool {
        self.entries.contains_key(qid)
    }

    /// Record a terminal status for `qid` (in memory; call [`persist`]).
    ///
    /// [`persist`]: DedupeStore::persist
    pub fn record(&mut self, qid: &str, status: QueueStatus) {
        debug_assert!(status.is_terminal());
        self.entries.insert(qid.to_string(), status.as_str().to_string());
    }

    /// Number of recorded terminal `qid`s.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the store to disk atomically.
    pub fn persist(&self) -> Result<(), QueueError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| QueueError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        let data = serde_json::to_vec_pretty(&self.entries)
            .map_err(steward_core::ContractError::from)?;

        let parent = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut tmp = tempfile::Builder::new()
            .prefix(".tmp_")
            .tempfile_in(parent)
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
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = DedupeStore::load(dir.path().join(".exec_executed.json"));
        assert!(store.is_empty());
        assert!(!store.contains("send_1"));
    }

    #[test]
    fn survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".exec_executed.json");

        let mut store = DedupeStore::load(&path);
        store.record("send_1", QueueStatus::Done);
        store.record("ev_1", QueueStatus::Rejected);
        store.persist().unwrap();

        let reloaded = DedupeStore::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("send_1"));
        assert!(reloaded.contains("ev_1"));
    }

    #[test]
    fn corrupt_store_starts_empty_without_clobbering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".exec_executed.json");
        std::fs::write(&path, "not json").unwrap();

        let store = DedupeStore::load(&path);
        assert!(store.is_empty());
        // Until the executor persists, the original bytes survive.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
    }

    #[test]
    fn recorded_statuses_are_terminal_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".exec_executed.json");
        let mut store = DedupeStore::load(&path);
        store.record("a", QueueStatus::Error);
        store.persist().unwrap();

        let raw: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["a"], "error");
    }
}
