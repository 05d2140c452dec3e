// SPDX-License-Identifier: MIT OR Apache-2.0
//! `steward-execd` — the executor daemon binary.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use steward_config::Config;
use steward_exec::writers::{CalendarRestWriter, GmailRestWriter};
use steward_exec::{DefaultWriters, ExecutorDaemon};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "steward-execd", version, about = "Steward executor daemon")]
struct Cli {
    /// Artifact directory shared with the orchestrator.
    #[arg(long, default_value = "artifacts")]
    artifacts: PathBuf,

    /// Poll interval in milliseconds.
    #[arg(long, default_value_t = 500)]
    poll_ms: u64,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
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

    let cfg = Config::from_env();
    for warning in cfg.validate().context("validate configuration")? {
        tracing::warn!(%warning, "configuration warning");
    }

    let mail = GmailRestWriter::new(
        env_or("GMAIL_API_BASE_URL", "https://gmail.googleapis.com"),
        env_or("GMAIL_SEND_TOKEN", "secrets/tokens/gmail_send_token.json"),
    );
    let calendar = CalendarRestWriter::new(
        env_or("GCAL_API_BASE_URL", "https://www.googleapis.com"),
        env_or("GCAL_WRITE_TOKEN", "secrets/tokens/gcal_write_token.json"),
    );
    let forum = steward_exec::forum::ForumClient::from_credentials_file(
        cfg.forum_base_url.clone(),
        &cfg.forum_credentials_path,
    )
    .unwrap_or_else(|e| {
        tracing::warn!(error = %e, "forum credentials unavailable; forum writes will fail");
        steward_exec::forum::ForumClient::new(
            cfg.forum_base_url.clone(),
            steward_exec::forum::ForumCredentials {
                api_key: String::new(),
                agent_name: "steward".to_string(),
            },
        )
    });

    let daemon = ExecutorDaemon::new(
        &cli.artifacts,
        cfg.exec_secret_bytes().to_vec(),
        Arc::new(DefaultWriters::new(mail, calendar, forum)),
    )
    .context("start executor daemon")?
    .with_poll_interval(Duration::from_millis(cli.poll_ms));

    tokio::select! {
        _ = daemon.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }
    Ok(())
}
