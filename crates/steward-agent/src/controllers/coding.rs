// SPDX-License-Identifier: MIT OR Apache-2.0
//! The coding controller: run a repository's test suite locally and capture
//! the output as artifacts. No queue entry; a test run has no external
//! effect to approve.

use super::write_draft;
use crate::AgentError;
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use steward_core::{ExecutionResult, Intent};
use tokio::process::Command;
use tracing::warn;

/// Hard cap on a test run.
const RUN_TIMEOUT: Duration = Duration::from_secs(1200);

/// Realizes `run_tests` intents.
pub struct CodingController {
    artifacts_dir: PathBuf,
}

impl CodingController {
    /// A controller writing under `artifacts_dir`.
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
        }
    }

    /// Run the intent's test suite in its repository, capturing stdout and
    /// stderr to timestamped artifact files.
    pub async fn execute(&self, intent: &Intent) -> Result<ExecutionResult, AgentError> {
        if intent.kind != "run_tests" {
            return Ok(ExecutionResult::skipped("unsupported_intent"));
        }

        let repo = {
            let r = intent.payload_str("repo");
            if r.is_empty() { "." } else { r }.to_string()
        };
        let suite = {
            let s = intent.payload_str("suite");
            if s.is_empty() {
                crate::schedulers::DEFAULT_SUITE
            } else {
                s
            }
            .to_string()
        };
        let argv: Vec<&str> = suite.split_whitespace().collect();
        let Some((program, args)) = argv.split_first() else {
            return Ok(ExecutionResult::fail(Vec::new(), "empty_suite"));
        };

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let out_path = self.artifacts_dir.join(format!("coding/tests_{stamp}.out.txt"));
        let err_path = self.artifacts_dir.join(format!("coding/tests_{stamp}.err.txt"));

        let run = tokio::time::timeout(
            RUN_TIMEOUT,
            Command::new(program).args(args).current_dir(&repo).output(),
        )
        .await;

        match run {
            Ok(Ok(output)) => {
                write_draft(&out_path, &String::from_utf8_lossy(&output.stdout))?;
                write_draft(&err_path, &String::from_utf8_lossy(&output.stderr))?;
                let rc = output.status.code().unwrap_or(-1);
                let result = if output.status.success() {
                    ExecutionResult::ok(vec![out_path, err_path], format!("rc={rc}"))
                } else {
                    ExecutionResult::fail(vec![out_path, err_path], format!("rc={rc}"))
                };
                Ok(result)
            }
            Ok(Err(e)) => {
                warn!(repo, error = %e, "test runner failed to start");
                write_draft(&err_path, &e.to_string())?;
                Ok(ExecutionResult::fail(vec![err_path], "runner_error"))
            }
            Err(_) => {
                write_draft(&err_path, "test run timed out")?;
                Ok(ExecutionResult::fail(vec![err_path], "runner_error"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_core::Domain;

    fn run_tests_intent(repo: &str, suite: &str) -> Intent {
        Intent::new(Domain::Coding, "run_tests")
            .with_payload("repo", repo)
            .with_payload("suite", suite)
    }

    #[tokio::test]
    async fn successful_suite_captures_stdout() {
        let artifacts = tempfile::tempdir().unwrap();
        let repo = tempfile::tempdir().unwrap();
        let ctrl = CodingController::new(artifacts.path());

        let res = ctrl
            .execute(&run_tests_intent(
                &repo.path().to_string_lossy(),
                "echo all tests passed",
            ))
            .await
            .unwrap();
        assert_eq!(res.status, steward_core::ExecStatus::Ok);
        assert_eq!(res.note, "rc=0");
        assert_eq!(res.artifacts.len(), 2);

        let out = std::fs::read_to_string(&res.artifacts[0]).unwrap();
        assert!(out.contains("all tests passed"));
    }

    #[tokio::test]
    async fn failing_suite_reports_nonzero_rc() {
        let artifacts = tempfile::tempdir().unwrap();
        let repo = tempfile::tempdir().unwrap();
        let ctrl = CodingController::new(artifacts.path());

        let res = ctrl
            .execute(&run_tests_intent(&repo.path().to_string_lossy(), "false"))
            .await
            .unwrap();
        assert_eq!(res.status, steward_core::ExecStatus::Fail);
        assert!(res.note.starts_with("rc="));
        assert_ne!(res.note, "rc=0");
    }

    #[tokio::test]
    async fn missing_program_is_a_runner_error() {
        let artifacts = tempfile::tempdir().unwrap();
        let ctrl = CodingController::new(artifacts.path());

        let res = ctrl
            .execute(&run_tests_intent(".", "definitely-not-a-real-binary-xyz"))
            .await
            .unwrap();
        assert_eq!(res.status, steward_core::ExecStatus::Fail);
        assert_eq!(res.note, "runner_error");
    }

    #[tokio::test]
    async fn other_intents_are_skipped() {
        let artifacts = tempfile::tempdir().unwrap();
        let ctrl = CodingController::new(artifacts.path());
        let res = ctrl
            .execute(&Intent::new(Domain::Coding, "draft_patch"))
            .await
            .unwrap();
        assert_eq!(res.note, "unsupported_intent");
    }
}
