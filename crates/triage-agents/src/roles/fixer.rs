//! Fixer agent builder.
//!
//! An opaque patch-generator role: it receives the analysis (or reviewer
//! feedback) in the prompt and returns text containing the patch object.
//! NO tools: all the context it needs arrives in the prompt.

use rig::client::CompletionClient;
use rig::providers::openai;

use crate::prompts;

use super::channel::OaiAgent;

pub fn build_fixer(client: &openai::CompletionsClient, model: &str) -> OaiAgent {
    client
        .agent(model)
        .name("fixer")
        .description("Produces a diff-formatted patch from a structured analysis")
        .preamble(prompts::FIXER_PREAMBLE)
        .temperature(0.1)
        .build()
}
