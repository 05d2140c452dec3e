// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conservative auto-approval predicates.
//!
//! Deterministic functions of (spec, config, clock). A `false` here is a
//! silent skip, not an error; the item simply stays pending for a human.

use chrono::{DateTime, Duration, Local, NaiveDateTime};
use steward_config::{Config, POLICY_CONSERVATIVE};
use steward_queue::{CreateEventSpec, SendEmailSpec};

/// Parse an ISO-8601 instant, tolerating a trailing `Z` and naive local
/// times. Returns the instant in the host's local timezone.
fn parse_iso_local(ts: &str) -> Option<DateTime<Local>> {
    if ts.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Local));
    }
    // Naive timestamps are taken as local wall-clock time.
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts, fmt) {
            return naive.and_local_timezone(Local).single();
        }
    }
    None
}

/// Whether a send may be auto-approved: conservative policy, recipient is
/// exactly the configured self address (trimmed, case-insensitive),
/// non-empty subject of at most 200 characters, and a readable body file.
pub fn can_auto_approve_send(spec: &SendEmailSpec, cfg: &Config) -> bool {
    if cfg.auto_approve_policy != POLICY_CONSERVATIVE {
        return false;
    }
    if spec.to.is_empty() || cfg.self_email.is_empty() {
        return false;
    }
    if spec.to.trim().to_lowercase() != cfg.self_email.trim().to_lowercase() {
        return false;
    }
    if spec.subject.is_empty() || spec.subject.chars().count() > 200 {
        return false;
    }
    match std::fs::metadata(&spec.body_md_path) {
        Ok(meta) if meta.is_file() => std::fs::File::open(&spec.body_md_path).is_ok(),
        _ => false,
    }
}

/// Whether an event may be auto-approved, judged against the current local
/// time. See [`can_auto_approve_event_at`] for the rules.
pub fn can_auto_approve_event(spec: &CreateEventSpec, cfg: &Config) -> bool {
    can_auto_approve_event_at(spec, cfg, Local::now())
}

/// Whether an event may be auto-approved at `now`: conservative policy, the
/// configured auto calendar only, non-empty title, no attendees, parseable
/// start/end with the start strictly in the future and within the window,
/// positive duration of at most the configured maximum, and both start and
/// end hours inside the inclusive local-time band.
pub fn can_auto_approve_event_at(
    spec: &CreateEventSpec,
    cfg: &Config,
    now: DateTime<Local>,
) -> bool {
    if cfg.auto_approve_policy != POLICY_CONSERVATIVE {
        return false;
    }
    if spec.calendar_id != cfg.auto_calendar_id {
        return false;
    }
    if spec.title.is_empty() {
        return false;
    }
    if !spec.attendees.is_empty() {
        return false;
    }

    let Some(start) = parse_iso_local(&spec.start_iso) else {
        return false;
    };
    let Some(end) = parse_iso_local(&spec.end_iso) else {
        return false;
    };

    if start <= now {
        return false;
    }
    if start - now > Duration::days(cfg.event_window_days) {
        return false;
    }

    let dur_min = (end - start).num_seconds() as f64 / 60.0;
    if dur_min <= 0.0 || dur_min > cfg.event_max_duration_min as f64 {
        return false;
    }

    let hours = cfg.event_start_hour..=cfg.event_end_hour;
    use chrono::Timelike;
    hours.contains(&start.hour()) && hours.contains(&end.hour())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Timelike};
    use std::io::Write;

    fn cfg() -> Config {
        Config {
            exec_secret: "secret".to_string(),
            auto_approve: true,
            self_email: "me@example.com".to_string(),
            ..Config::default()
        }
    }

    fn body_file(dir: &tempfile::TempDir) -> String {
        let path = dir.path().join("draft.md");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "hello").unwrap();
        path.to_string_lossy().into_owned()
    }

    fn send_spec(to: &str, body_md_path: String) -> SendEmailSpec {
        SendEmailSpec {
            qid: "send_1".to_string(),
            thread_id: "t1".to_string(),
            to: to.to_string(),
            subject: "Hi".to_string(),
            body_md_path,
            reply_to_message_id: None,
        }
    }

    fn event_spec(start: DateTime<Local>, minutes: i64) -> CreateEventSpec {
        CreateEventSpec {
            qid: "ev_1".to_string(),
            calendar_id: "primary".to_string(),
            title: "Focus time".to_string(),
            start_iso: start.to_rfc3339(),
            end_iso: (start + Duration::minutes(minutes)).to_rfc3339(),
            description_md_path: "desc.md".to_string(),
            attendees: Vec::new(),
        }
    }

    fn tomorrow_at_ten() -> DateTime<Local> {
        (Local::now() + Duration::days(1))
            .with_hour(10)
            .and_then(|t| t.with_minute(0))
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap()
    }

    #[test]
    fn send_accepts_self_recipient() {
        let dir = tempfile::tempdir().unwrap();
        let spec = send_spec("me@example.com", body_file(&dir));
        assert!(can_auto_approve_send(&spec, &cfg()));
    }

    #[test]
    fn send_accepts_self_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let spec = send_spec(" Me@Example.COM ", body_file(&dir));
        assert!(can_auto_approve_send(&spec, &cfg()));
    }

    #[test]
    fn send_rejects_third_party_recipient() {
        let dir = tempfile::tempdir().unwrap();
        let spec = send_spec("other@example.com", body_file(&dir));
        assert!(!can_auto_approve_send(&spec, &cfg()));
    }

    #[test]
    fn send_rejects_empty_recipient() {
        let dir = tempfile::tempdir().unwrap();
        let spec = send_spec("", body_file(&dir));
        assert!(!can_auto_approve_send(&spec, &cfg()));
    }

    #[test]
    fn send_rejects_when_no_self_email_configured() {
        let dir = tempfile::tempdir().unwrap();
        let spec = send_spec("me@example.com", body_file(&dir));
        let cfg = Config {
            self_email: String::new(),
            ..cfg()
        };
        assert!(!can_auto_approve_send(&spec, &cfg));
    }

    #[test]
    fn send_rejects_oversized_subject() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = send_spec("me@example.com", body_file(&dir));
        spec.subject = "x".repeat(201);
        assert!(!can_auto_approve_send(&spec, &cfg()));
    }

    #[test]
    fn send_rejects_missing_body_file() {
        let spec = send_spec("me@example.com", "/nonexistent/draft.md".to_string());
        assert!(!can_auto_approve_send(&spec, &cfg()));
    }

    #[test]
    fn send_rejects_non_conservative_policy() {
        let dir = tempfile::tempdir().unwrap();
        let spec = send_spec("me@example.com", body_file(&dir));
        let cfg = Config {
            auto_approve_policy: "permissive".to_string(),
            ..cfg()
        };
        assert!(!can_auto_approve_send(&spec, &cfg));
    }

    #[test]
    fn event_accepts_simple_tomorrow() {
        let spec = event_spec(tomorrow_at_ten(), 60);
        assert!(can_auto_approve_event(&spec, &cfg()));
    }

    #[test]
    fn event_rejects_attendees() {
        let mut spec = event_spec(tomorrow_at_ten(), 60);
        spec.attendees.push("a@example.com".to_string());
        assert!(!can_auto_approve_event(&spec, &cfg()));
    }

    #[test]
    fn event_rejects_outside_window() {
        let start = (Local::now() + Duration::days(10))
            .with_hour(10)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap();
        let spec = event_spec(start, 60);
        // Default window is 7 days.
        assert!(!can_auto_approve_event(&spec, &cfg()));
    }

    #[test]
    fn event_rejects_past_start() {
        let start = (Local::now() - Duration::hours(2))
            .with_nanosecond(0)
            .unwrap();
        let spec = event_spec(start, 30);
        assert!(!can_auto_approve_event(&spec, &cfg()));
    }

    #[test]
    fn event_rejects_overlong_duration() {
        // Default maximum is 120 minutes.
        let spec = event_spec(tomorrow_at_ten(), 180);
        assert!(!can_auto_approve_event(&spec, &cfg()));
    }

    #[test]
    fn event_rejects_non_positive_duration() {
        let spec = event_spec(tomorrow_at_ten(), 0);
        assert!(!can_auto_approve_event(&spec, &cfg()));
        let spec = event_spec(tomorrow_at_ten(), -30);
        assert!(!can_auto_approve_event(&spec, &cfg()));
    }

    #[test]
    fn event_rejects_outside_local_hours() {
        let start = tomorrow_at_ten().with_hour(22).unwrap();
        let spec = event_spec(start, 30);
        // Default band is 08..=20 local.
        assert!(!can_auto_approve_event(&spec, &cfg()));
    }

    #[test]
    fn event_rejects_foreign_calendar() {
        let mut spec = event_spec(tomorrow_at_ten(), 60);
        spec.calendar_id = "work".to_string();
        assert!(!can_auto_approve_event(&spec, &cfg()));
    }

    #[test]
    fn event_rejects_unparseable_times() {
        let mut spec = event_spec(tomorrow_at_ten(), 60);
        spec.start_iso = "sometime tomorrow".to_string();
        assert!(!can_auto_approve_event(&spec, &cfg()));

        let mut spec = event_spec(tomorrow_at_ten(), 60);
        spec.end_iso = String::new();
        assert!(!can_auto_approve_event(&spec, &cfg()));
    }

    #[test]
    fn event_tolerates_trailing_z() {
        // Fixed instant: deterministic via the explicit-now variant.
        let now = DateTime::parse_from_rfc3339("2026-03-02T09:00:00+00:00")
            .unwrap()
            .with_timezone(&Local);
        let start = now + Duration::hours(26);
        let mut spec = event_spec(start, 60);
        spec.start_iso = start
            .with_timezone(&chrono::Utc)
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
        spec.end_iso = (start + Duration::minutes(60))
            .with_timezone(&chrono::Utc)
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();

        use chrono::Timelike;
        let in_band = (8..=20).contains(&start.hour())
            && (8..=20).contains(&(start + Duration::minutes(60)).hour());
        assert_eq!(can_auto_approve_event_at(&spec, &cfg(), now), in_band);
    }

    #[test]
    fn parse_iso_local_accepts_naive_times() {
        assert!(parse_iso_local("2026-03-02T10:00:00").is_some());
        assert!(parse_iso_local("2026-03-02T10:00:00.123").is_some());
        assert!(parse_iso_local("2026-03-02T10:00:00Z").is_some());
        assert!(parse_iso_local("2026-03-02T10:00:00+02:00").is_some());
        assert!(parse_iso_local("").is_none());
        assert!(parse_iso_local("not a time").is_none());
    }
}
