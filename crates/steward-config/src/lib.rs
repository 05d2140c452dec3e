// SPDX-License-Identifier: MIT OR Apache-2.0
//! steward-config
//!
//! Runtime settings for the orchestrator, the approval engine, and the
//! executor daemon. Everything is sourced from `STEWARD_*` environment
//! variables; the HMAC secret in particular lives only in process memory and
//! must never be persisted to the queues or the ledger.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;

/// Errors from semantic validation of a loaded configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// One or more settings are out of range or inconsistent.
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

/// Advisory issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Auto-approval is requested but cannot run.
    AutoApproveDisabled {
        /// Why the engine will not mint tokens.
        reason: String,
    },
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::AutoApproveDisabled { reason } => {
                write!(f, "auto-approval disabled: {reason}")
            }
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
        }
    }
}

/// Policy name under which the conservative auto-approval predicates apply.
/// Any other value disables auto-approval entirely.
pub const POLICY_CONSERVATIVE: &str = "conservative";

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// LLM provider selector (`ollama` | `openai` | `anthropic` | empty).
    pub llm_provider: String,
    /// Ollama endpoint, used when the provider is `ollama`.
    pub ollama_base_url: String,
    /// Ollama model name.
    pub ollama_model: String,

    /// Shared HMAC secret for approval tokens. Empty disables auto-approval
    /// and aborts executor startup.
    pub exec_secret: String,

    /// Master switch for the auto-approval engine.
    pub auto_approve: bool,
    /// Active auto-approval policy name.
    pub auto_approve_policy: String,
    /// The only recipient address sends may be auto-approved for.
    pub self_email: String,
    /// Token lifetime for auto-minted approvals, seconds.
    pub auto_approve_ttl_s: i64,
    /// How far ahead events may be auto-approved, days.
    pub event_window_days: i64,
    /// Longest auto-approvable event, minutes.
    pub event_max_duration_min: i64,
    /// Earliest auto-approvable local start/end hour (inclusive).
    pub event_start_hour: u32,
    /// Latest auto-approvable local start/end hour (inclusive).
    pub event_end_hour: u32,
    /// The only calendar events may be auto-approved on.
    pub auto_calendar_id: String,

    /// Whether the forum feed is read at all.
    pub forum_enabled: bool,
    /// Forum API base URL.
    pub forum_base_url: String,
    /// Path to the forum credentials JSON (`{api_key, agent_name}`).
    pub forum_credentials_path: String,
    /// Feed sort order requested from the forum.
    pub forum_feed_sort: String,
    /// Maximum feed items fetched per tick.
    pub forum_feed_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_provider: String::new(),
            ollama_base_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.1".to_string(),
            exec_secret: String::new(),
            auto_approve: false,
            auto_approve_policy: POLICY_CONSERVATIVE.to_string(),
            self_email: String::new(),
            auto_approve_ttl_s: 600,
            event_window_days: 7,
            event_max_duration_min: 120,
            event_start_hour: 8,
            event_end_hour: 20,
            auto_calendar_id: "primary".to_string(),
            forum_enabled: false,
            forum_base_url: "https://forum.example.com".to_string(),
            forum_credentials_path: "~/.config/steward/forum_credentials.json".to_string(),
            forum_feed_sort: "hot".to_string(),
            forum_feed_limit: 10,
        }
    }
}

impl Config {
    /// Load the configuration from `STEWARD_*` environment variables,
    /// falling back to the defaults above.
    pub fn from_env() -> Self {
        let d = Config::default();
        Self {
            llm_provider: env_str("STEWARD_LLM_PROVIDER", "").trim().to_lowercase(),
            ollama_base_url: env_str("OLLAMA_BASE_URL", &d.ollama_base_url),
            ollama_model: env_str("OLLAMA_MODEL", &d.ollama_model),
            exec_secret: env_str("STEWARD_EXEC_SECRET", ""),
            auto_approve: env_bool("STEWARD_AUTO_APPROVE", false),
            auto_approve_policy: env_str("STEWARD_AUTO_APPROVE_POLICY", POLICY_CONSERVATIVE)
                .trim()
                .to_lowercase(),
            self_email: env_str("STEWARD_SELF_EMAIL", "").trim().to_string(),
            auto_approve_ttl_s: env_int("STEWARD_AUTO_APPROVE_TTL_S", d.auto_approve_ttl_s),
            event_window_days: env_int(
                "STEWARD_AUTO_APPROVE_EVENT_WINDOW_DAYS",
                d.event_window_days,
            ),
            event_max_duration_min: env_int(
                "STEWARD_AUTO_APPROVE_EVENT_MAX_DURATION_MIN",
                d.event_max_duration_min,
            ),
            event_start_hour: env_int("STEWARD_AUTO_APPROVE_EVENT_START_HOUR", 8).clamp(0, 23)
                as u32,
            event_end_hour: env_int("STEWARD_AUTO_APPROVE_EVENT_END_HOUR", 20).clamp(0, 23) as u32,
            auto_calendar_id: env_str("STEWARD_AUTO_APPROVE_CALENDAR_ID", &d.auto_calendar_id),
            forum_enabled: env_bool("STEWARD_FORUM_ENABLED", false),
            forum_base_url: env_str("STEWARD_FORUM_BASE_URL", &d.forum_base_url),
            forum_credentials_path: env_str(
                "STEWARD_FORUM_CREDENTIALS_PATH",
                &d.forum_credentials_path,
            ),
            forum_feed_sort: env_str("STEWARD_FORUM_FEED_SORT", &d.forum_feed_sort),
            forum_feed_limit: env_int("STEWARD_FORUM_FEED_LIMIT", 10).max(0) as u32,
        }
    }

    /// The HMAC secret as bytes. Empty slice when unset.
    pub fn exec_secret_bytes(&self) -> &[u8] {
        self.exec_secret.as_bytes()
    }

    /// Whether the auto-approval engine may mint tokens at all.
    pub fn auto_approve_armed(&self) -> bool {
        self.auto_approve && !self.exec_secret.is_empty()
    }

    /// Validate settings, returning advisory warnings.
    ///
    /// Hard errors (inverted hour window, non-positive TTL, negative window)
    /// come back as [`ConfigError::ValidationError`]; soft issues are
    /// warnings.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<ConfigWarning> = Vec::new();

        if self.event_start_hour > 23 {
            errors.push(format!(
                "event_start_hour {} out of range (0..=23)",
                self.event_start_hour
            ));
        }
        if self.event_end_hour > 23 {
            errors.push(format!(
                "event_end_hour {} out of range (0..=23)",
                self.event_end_hour
            ));
        }
        if self.event_start_hour > self.event_end_hour {
            errors.push(format!(
                "event hour window is inverted ({}..{})",
                self.event_start_hour, self.event_end_hour
            ));
        }
        if self.auto_approve_ttl_s <= 0 {
            errors.push(format!(
                "auto_approve_ttl_s must be positive, got {}",
                self.auto_approve_ttl_s
            ));
        }
        if self.event_window_days < 0 {
            errors.push(format!(
                "event_window_days must be non-negative, got {}",
                self.event_window_days
            ));
        }
        if self.event_max_duration_min <= 0 {
            errors.push(format!(
                "event_max_duration_min must be positive, got {}",
                self.event_max_duration_min
            ));
        }

        if self.auto_approve && self.exec_secret.is_empty() {
            warnings.push(ConfigWarning::AutoApproveDisabled {
                reason: "STEWARD_EXEC_SECRET is empty".to_string(),
            });
        }
        if self.auto_approve && self.self_email.is_empty() {
            warnings.push(ConfigWarning::MissingOptionalField {
                field: "self_email".to_string(),
                hint: "send drafts can never be auto-approved".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigError::ValidationError { reasons: errors })
        }
    }
}

fn env_str(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => parse_bool(&raw, default),
        Err(_) => default,
    }
}

fn env_int(name: &str, default: i64) -> i64 {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().unwrap_or(default),
        _ => default,
    }
}

/// Truthy strings: `1`, `true`, `yes`, `y`, `on` (case-insensitive).
fn parse_bool(raw: &str, default: bool) -> bool {
    let t = raw.trim().to_lowercase();
    if t.is_empty() {
        return default;
    }
    matches!(t.as_str(), "1" | "true" | "yes" | "y" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let cfg = Config::default();
        assert_eq!(cfg.auto_approve_policy, POLICY_CONSERVATIVE);
        assert!(!cfg.auto_approve);
        assert!(cfg.exec_secret.is_empty());
        assert_eq!(cfg.auto_approve_ttl_s, 600);
        assert_eq!(cfg.event_window_days, 7);
        assert_eq!(cfg.event_max_duration_min, 120);
        assert_eq!((cfg.event_start_hour, cfg.event_end_hour), (8, 20));
        assert_eq!(cfg.auto_calendar_id, "primary");
    }

    #[test]
    fn default_config_validates_with_no_warnings() {
        let warnings = Config::default().validate().unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn armed_requires_both_switch_and_secret() {
        let mut cfg = Config::default();
        assert!(!cfg.auto_approve_armed());
        cfg.auto_approve = true;
        assert!(!cfg.auto_approve_armed());
        cfg.exec_secret = "secret".to_string();
        assert!(cfg.auto_approve_armed());
    }

    #[test]
    fn auto_approve_without_secret_warns() {
        let cfg = Config {
            auto_approve: true,
            self_email: "me@example.com".to_string(),
            ..Config::default()
        };
        let warnings = cfg.validate().unwrap();
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, ConfigWarning::AutoApproveDisabled { .. }))
        );
    }

    #[test]
    fn inverted_hour_window_is_an_error() {
        let cfg = Config {
            event_start_hour: 20,
            event_end_hour: 8,
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn non_positive_ttl_is_an_error() {
        let cfg = Config {
            auto_approve_ttl_s: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parse_bool_accepts_common_truthy_forms() {
        for raw in ["1", "true", "YES", " on ", "y"] {
            assert!(parse_bool(raw, false), "{raw} should be truthy");
        }
        for raw in ["0", "false", "no", "off", "nope"] {
            assert!(!parse_bool(raw, true), "{raw} should be falsy");
        }
        assert!(parse_bool("", true));
        assert!(!parse_bool("", false));
    }

    #[test]
    fn secret_bytes_track_the_string() {
        let cfg = Config {
            exec_secret: "secret".to_string(),
            ..Config::default()
        };
        assert_eq!(cfg.exec_secret_bytes(), b"secret");
    }
}
