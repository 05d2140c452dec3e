// SPDX-License-Identifier: MIT OR Apache-2.0
//! steward-ledger
//!
//! The append-only audit trail. Both the orchestrator and the executor
//! daemon write here; one append is one JSON object on one line, flushed
//! before the call returns, so concurrent short appends interleave safely on
//! POSIX filesystems. Nothing ever rewrites a line.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Errors raised while appending to the ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The record could not be serialized to JSON.
    #[error("ledger record serialization failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The ledger file could not be opened or written.
    #[error("ledger write to {path} failed: {source}")]
    Io {
        /// Ledger file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// One audit record: a kind tag plus kind-specific fields.
///
/// The `ts` field is stamped at append time in UTC ISO-8601.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerRecord {
    ts: String,
    kind: String,
    #[serde(flatten)]
    fields: BTreeMap<String, serde_json::Value>,
}

impl LedgerRecord {
    /// Start a record of the given kind, timestamped now.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            kind: kind.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Attach a field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// The record's kind tag.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

/// Handle on the ledger file. Cheap to clone paths around; every append
/// reopens in append mode so two processes can share one ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    /// A ledger at `path`. The parent directory is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The ledger file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as one line and flush.
    pub fn append(&self, record: &LedgerRecord) -> Result<(), LedgerError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LedgerError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| LedgerError::Io {
                path: self.path.clone(),
                source,
            })?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| LedgerError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
