// SPDX-License-Identifier: MIT OR Apache-2.0
//! `steward` — the orchestrator binary.
//!
//! Runs N ticks of propose → gate → arbitrate → draft → enqueue → approve.
//! The mail and calendar readers are external; without them the schedulers
//! see empty state, which still exercises the coding and forum domains.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use steward_agent::{Orchestrator, StateProvider, TickInputs};
use steward_config::Config;
use steward_exec::forum::ForumClient;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "steward", version, about = "Steward companion orchestrator")]
struct Cli {
    /// Number of ticks to run.
    #[arg(long, default_value_t = 5)]
    ticks: u32,

    /// Artifact directory shared with the executor daemon.
    #[arg(long, default_value = "artifacts")]
    artifacts: PathBuf,

    /// Repository paths for the coding scheduler. Can be repeated.
    #[arg(long)]
    repos: Vec<String>,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

/// Gathers tick inputs: configured repos always, the forum feed when
/// enabled. Reader failures surface as empty state, never as errors.
struct CliStateProvider {
    repos: Vec<String>,
    forum: Option<ForumClient>,
    feed_sort: String,
    feed_limit: u32,
}

#[async_trait]
impl StateProvider for CliStateProvider {
    async fn gather(&self) -> TickInputs {
        let posts = match &self.forum {
            Some(client) => match client.list_posts(&self.feed_sort, self.feed_limit).await {
                Ok(posts) => posts,
                Err(e) => {
                    warn!(error = %e, "forum feed unavailable, continuing with empty state");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        TickInputs {
            repos: self.repos.clone(),
            posts,
            ..TickInputs::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    std::fs::create_dir_all(&cli.artifacts)
        .with_context(|| format!("create artifact dir {}", cli.artifacts.display()))?;

    let cfg = Config::from_env();
    for warning in cfg.validate().context("validate configuration")? {
        warn!(%warning, "configuration warning");
    }

    let forum = if cfg.forum_enabled {
        match ForumClient::from_credentials_file(cfg.forum_base_url.clone(), &cfg.forum_credentials_path)
        {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "forum disabled: credentials unavailable");
                None
            }
        }
    } else {
        None
    };

    let provider = CliStateProvider {
        repos: cli.repos.clone(),
        forum,
        feed_sort: cfg.forum_feed_sort.clone(),
        feed_limit: cfg.forum_feed_limit,
    };

    let llm = steward_llm::build_llm(&cfg);
    let orchestrator = Orchestrator::new(&cli.artifacts, cfg, llm);
    orchestrator.run_ticks(cli.ticks, &provider).await;
    Ok(())
}
