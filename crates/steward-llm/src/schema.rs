// SPDX-License-Identifier: MIT OR Apache-2.0
//! Strict validation of model-proposed intent batches.
//!
//! The model's JSON is untrusted output: every record must land in the
//! closed domain set with scores and effort in range before it becomes an
//! [`Intent`]. One bad record fails the whole batch and the caller falls
//! back to its heuristic.

use serde::Deserialize;
use std::collections::BTreeMap;
use steward_core::{Domain, Intent};

/// Why a proposed batch was thrown away.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The value is not a `{"intents": [...]}` object of records.
    #[error("intent batch has the wrong shape: {0}")]
    Shape(String),

    /// A record's domain is outside the closed set.
    #[error("intent {index} has unknown domain '{domain}'")]
    UnknownDomain {
        /// Position in the batch.
        index: usize,
        /// The offending domain string.
        domain: String,
    },

    /// A record's value or urgency is outside [0, 1].
    #[error("intent {index} has out-of-range score")]
    BadScore {
        /// Position in the batch.
        index: usize,
    },

    /// A record's effort is outside [0, 3600].
    #[error("intent {index} has out-of-range effort {effort_s}")]
    BadEffort {
        /// Position in the batch.
        index: usize,
        /// The offending effort.
        effort_s: i64,
    },
}

fn default_score() -> f64 {
    0.5
}

fn default_effort() -> i64 {
    60
}

#[derive(Debug, Deserialize)]
struct IntentRecord {
    domain: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: BTreeMap<String, serde_json::Value>,
    #[serde(default = "default_score")]
    value: f64,
    #[serde(default = "default_score")]
    urgency: f64,
    #[serde(default = "default_effort")]
    effort_s: i64,
    #[serde(default)]
    preconditions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct IntentBatch {
    #[serde(default)]
    intents: Vec<IntentRecord>,
}

/// Validate a model-proposed batch and convert it into intents.
///
/// # Errors
///
/// Any record failing the schema (unknown domain, score outside [0,1],
/// effort outside [0,3600], wrong overall shape) rejects the entire batch.
pub fn parse_intent_batch(value: &serde_json::Value) -> Result<Vec<Intent>, SchemaError> {
    let batch: IntentBatch =
        serde_json::from_value(value.clone()).map_err(|e| SchemaError::Shape(e.to_string()))?;

    let mut intents = Vec::with_capacity(batch.intents.len());
    for (index, rec) in batch.intents.into_iter().enumerate() {
        let domain: Domain = rec
            .domain
            .parse()
            .map_err(|_| SchemaError::UnknownDomain {
                index,
                domain: rec.domain.clone(),
            })?;
        if !((0.0..=1.0).contains(&rec.value) && (0.0..=1.0).contains(&rec.urgency)) {
            return Err(SchemaError::BadScore { index });
        }
        if !(0..=3600).contains(&rec.effort_s) {
            return Err(SchemaError::BadEffort {
                index,
                effort_s: rec.effort_s,
            });
        }

        let mut intent = Intent::new(domain, rec.kind).with_scores(
            rec.value,
            rec.urgency,
            rec.effort_s as u32,
        );
        intent.payload = rec.payload;
        intent.preconditions = if rec.preconditions.is_empty() {
            vec!["has_inbox_data".to_string()]
        } else {
            rec.preconditions
        };
        intents.push(intent);
    }
    Ok(intents)
}
