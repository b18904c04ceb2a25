//! Reviewer agent builder.
//!
//! NO tools: the reviewer only sees the problem statement and the patch
//! passed via prompt, and replies in free text. Approval is the literal
//! marker checked by [`crate::verdict`].

use rig::client::CompletionClient;
use rig::providers::openai;

use crate::prompts;

use super::channel::OaiAgent;

pub fn build_reviewer(client: &openai::CompletionsClient, model: &str) -> OaiAgent {
    client
        .agent(model)
        .name("reviewer")
        .description("Lenient patch reviewer. Replies free text; 'LGTM' approves.")
        .preamble(prompts::REVIEWER_PREAMBLE)
        .temperature(0.7)
        .build()
}
