//! Environment-driven pipeline configuration.
//!
//! Everything has a default so `PipelineConfig::default()` is a usable
//! starting point; the CLI overrides individual fields on top. Budgets are
//! configuration choices, not invariants; only their *semantics* (what
//! consumes which budget) are fixed.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use rig::providers::openai;

/// Default per-reply timeout for every `produce_reply` call.
const DEFAULT_REPLY_TIMEOUT_SECS: u64 = 120;

/// Top-level pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// OpenAI-compatible completions endpoint.
    pub api_base_url: String,
    /// API key for the endpoint.
    pub api_key: String,
    /// Model name used by all three roles.
    pub model: String,
    /// Optional GitHub token for the fetcher tools (raises rate limits).
    pub github_token: Option<String>,
    /// Fixer→Reviewer exchanges before the run is exhausted.
    pub round_budget: u32,
    /// Analyzer turns allowed before "analysis incomplete" aborts the run.
    /// A sub-budget distinct from `round_budget`: analyzer turns gather
    /// information, they are not retries of a decision.
    pub analyzer_turn_budget: u32,
    /// In-round retries for an incomplete fixer payload. Does not consume
    /// `round_budget`.
    pub fix_retry_cap: u32,
    /// Time bound on each individual `produce_reply` call.
    pub reply_timeout: Duration,
    /// Root directory for persisted run artifacts.
    pub artifacts_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_base_url: std::env::var("TRIAGE_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            api_key: std::env::var("TRIAGE_API_KEY").unwrap_or_default(),
            model: std::env::var("TRIAGE_MODEL").unwrap_or_else(|_| "gpt-4o".into()),
            github_token: std::env::var("TRIAGE_GITHUB_TOKEN").ok(),
            round_budget: u32_from_env("TRIAGE_MAX_ROUNDS", 3),
            analyzer_turn_budget: u32_from_env("TRIAGE_ANALYZER_TURNS", 5),
            fix_retry_cap: u32_from_env("TRIAGE_FIX_RETRIES", 2),
            reply_timeout: timeout_from_env(
                "TRIAGE_REPLY_TIMEOUT_SECS",
                DEFAULT_REPLY_TIMEOUT_SECS,
            ),
            artifacts_dir: std::env::var("TRIAGE_ARTIFACTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("artifacts")),
        }
    }
}

fn u32_from_env(var: &str, default: u32) -> u32 {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

/// Read a seconds timeout from the environment with a default.
pub fn timeout_from_env(var: &str, default_secs: u64) -> Duration {
    let secs = std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}

/// Pre-built rig client(s). One completions endpoint serves all three
/// roles; role differentiation happens via preamble and temperature.
pub struct ClientSet {
    pub completions: openai::CompletionsClient,
}

impl ClientSet {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let completions = openai::CompletionsClient::builder()
            .api_key(&config.api_key)
            .base_url(&config.api_base_url)
            .build()
            .context("failed to build completions client")?;
        Ok(Self { completions })
    }
}
