//! Analyzer agent builder.
//!
//! The analyzer is the only role with tools: it fetches the issue and as
//! much repository context as it wants before replying with its analysis
//! object. Tool failures come back as reply text, never as errors.

use rig::client::CompletionClient;
use rig::providers::openai;

use crate::github::GithubClient;
use crate::prompts;
use crate::tools::{FetchFileContentTool, FetchIssueTool, ListRepoPathsTool};

use super::channel::OaiAgent;

/// Tool-call turns the analyzer may take while assembling one reply.
const ANALYZER_MAX_TURNS: usize = 15;

pub fn build_analyzer(
    client: &openai::CompletionsClient,
    model: &str,
    github: GithubClient,
) -> OaiAgent {
    client
        .agent(model)
        .name("analyzer")
        .description("Fetches and analyzes GitHub issues into a structured analysis object")
        .preamble(prompts::ANALYZER_PREAMBLE)
        .temperature(0.1)
        .tool(FetchIssueTool::new(github.clone()))
        .tool(ListRepoPathsTool::new(github.clone()))
        .tool(FetchFileContentTool::new(github))
        .default_max_turns(ANALYZER_MAX_TURNS)
        .build()
}
