use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use triage_agents::artifacts::{ArtifactStore, RunId};
use triage_agents::config::PipelineConfig;
use triage_agents::github::parse_issue_url;
use triage_agents::pipeline::{outcome_to_json, PipelineController};
use triage_agents::prompts;
use triage_agents::roles::RoleSet;
use triage_agents::state_machine::PipelineState;

/// Drive the Analyzer → Fixer → Reviewer pipeline over one GitHub issue.
#[derive(Parser, Debug)]
#[command(name = "triage-agents", version)]
struct Cli {
    /// GitHub issue URL, e.g. https://github.com/owner/repo/issues/17
    issue_url: String,

    /// Fixer→Reviewer rounds before giving up.
    #[arg(long)]
    rounds: Option<u32>,

    /// Root directory for persisted run artifacts.
    #[arg(long)]
    artifacts_dir: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = PipelineConfig::default();
    if let Some(rounds) = cli.rounds {
        config.round_budget = rounds;
    }
    if let Some(dir) = cli.artifacts_dir {
        config.artifacts_dir = dir;
    }

    let issue = parse_issue_url(&cli.issue_url)?;
    let run_id = RunId::from_issue(&issue.owner, &issue.repo, issue.number);
    info!(run = %run_id, model = %config.model, "processing issue");

    let roles = RoleSet::from_config(&config)?;
    let store = Arc::new(ArtifactStore::new(&config.artifacts_dir));

    // Ctrl-C aborts at the next state boundary; persisted artifacts stay
    // on disk for inspection.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling at next state boundary");
            signal_token.cancel();
        }
    });

    let controller =
        PipelineController::new(run_id, roles, store, &config).with_cancellation(cancel);
    let outcome = controller
        .run(&prompts::coordinator_task(&cli.issue_url))
        .await?;

    println!("{}", serde_json::to_string_pretty(&outcome_to_json(&outcome))?);

    Ok(match outcome.status {
        PipelineState::Approved => ExitCode::SUCCESS,
        PipelineState::Exhausted => ExitCode::from(1),
        _ => ExitCode::from(2),
    })
}
