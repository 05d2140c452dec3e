// SPDX-License-Identifier: MIT OR Apache-2.0
//! The coding scheduler: one `run_tests` per configured repository.

use steward_core::{Domain, Intent};

/// Default test command when the intent does not carry one.
pub const DEFAULT_SUITE: &str = "cargo test -q";

/// Proposes `run_tests` intents over configured repositories.
pub struct CodingScheduler<'a> {
    repos: &'a [String],
}

impl<'a> CodingScheduler<'a> {
    /// A scheduler over the configured repository list.
    pub fn new(repos: &'a [String]) -> Self {
        Self { repos }
    }

    /// Propose candidate intents for this tick.
    pub fn propose(&self) -> Vec<Intent> {
        self.repos
            .iter()
            .map(|repo| {
                Intent::new(Domain::Coding, "run_tests")
                    .with_scores(0.6, 0.4, 600)
                    .with_payload("repo", repo.clone())
                    .with_payload("suite", DEFAULT_SUITE)
                    .with_preconditions(vec!["repo_available".to_string()])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_run_tests_per_repo() {
        let repos = vec!["/src/a".to_string(), "/src/b".to_string()];
        let intents = CodingScheduler::new(&repos).propose();
        assert_eq!(intents.len(), 2);
        assert_eq!(intents[0].kind, "run_tests");
        assert_eq!(intents[0].payload_str("repo"), "/src/a");
        assert_eq!(intents[0].payload_str("suite"), DEFAULT_SUITE);
    }

    #[test]
    fn no_repos_no_intents() {
        assert!(CodingScheduler::new(&[]).propose().is_empty());
    }
}
