//! Rig-backed implementation of [`RoleChannel`].
//!
//! Wraps a rig `Agent`, renders recent conversation history into the
//! prompt, and retries transient provider errors with exponential backoff.
//! Terminal errors are converted into explanatory reply text; the channel
//! never errors past its boundary.

use std::time::Duration;

use async_trait::async_trait;
use rig::agent::Agent;
use rig::completion::Prompt;
use rig::providers::openai;
use tracing::warn;

use crate::contracts::Role;
use crate::conversation::Turn;

use super::RoleChannel;

/// Type alias for agents built from OpenAI-compatible endpoints.
pub type OaiAgent = Agent<openai::completion::CompletionModel>;

/// How many trailing turns of history get rendered into the prompt.
const DEFAULT_HISTORY_WINDOW: usize = 8;

/// Retries for transient provider errors before giving up on an attempt.
const DEFAULT_MAX_RETRIES: u32 = 3;

pub struct RigChannel {
    role: Role,
    agent: OaiAgent,
    history_window: usize,
    max_retries: u32,
}

impl RigChannel {
    pub fn new(role: Role, agent: OaiAgent) -> Self {
        Self {
            role,
            agent,
            history_window: DEFAULT_HISTORY_WINDOW,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Render the trailing history window plus the prompt into one text block.
/// Rig agents are stateless per call, so the transcript rides along in the
/// prompt.
fn render_prompt(prompt: &str, history: &[Turn], window: usize) -> String {
    if history.is_empty() {
        return prompt.to_string();
    }
    let start = history.len().saturating_sub(window);
    let mut rendered = String::from("Conversation so far:\n\n");
    for turn in &history[start..] {
        rendered.push_str(&format!(
            "### {} (turn {})\n{}\n\n",
            turn.role, turn.seq, turn.text
        ));
    }
    rendered.push_str("---\n\n");
    rendered.push_str(prompt);
    rendered
}

#[async_trait]
impl RoleChannel for RigChannel {
    async fn produce_reply(&self, prompt: &str, history: &[Turn]) -> String {
        let full_prompt = render_prompt(prompt, history, self.history_window);
        match prompt_with_retry(&self.agent, &full_prompt, self.max_retries).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(role = %self.role, error = %e, "reply generation failed");
                format!("Error producing reply: {e}")
            }
        }
    }
}

/// Prompt an agent with exponential backoff retry for transient HTTP errors.
///
/// Retries on connection errors, 502, 503, 429 with backoff: 2s, 4s, 8s, ...
/// Non-transient errors fail immediately.
pub async fn prompt_with_retry(
    agent: &impl Prompt,
    prompt: &str,
    max_retries: u32,
) -> Result<String, rig::completion::PromptError> {
    let mut last_err = None;
    for attempt in 0..=max_retries {
        match agent.prompt(prompt).await {
            Ok(response) => return Ok(response),
            Err(e) => {
                let err_str = format!("{e}");
                let is_transient = is_transient_error(&err_str);

                if !is_transient || attempt == max_retries {
                    return Err(e);
                }

                let backoff = Duration::from_secs(2u64.pow(attempt + 1));
                warn!(
                    attempt = attempt + 1,
                    max_retries,
                    backoff_secs = backoff.as_secs(),
                    error = %err_str,
                    "transient provider error, retrying"
                );
                last_err = Some(e);
                tokio::time::sleep(backoff).await;
            }
        }
    }
    Err(last_err.unwrap())
}

/// Classify whether a provider error is transient (connection failures,
/// rate limits, proxy hiccups) vs permanent (auth errors, schema mismatches).
fn is_transient_error(err_str: &str) -> bool {
    let err_lower = err_str.to_ascii_lowercase();
    err_str.contains("502")
        || err_str.contains("503")
        || err_str.contains("429")
        || err_lower.contains("connection")
        || err_lower.contains("timed out")
        || err_lower.contains("timeout")
        || err_lower.contains("error sending request")
        || err_lower.contains("broken pipe")
        || err_lower.contains("reset by peer")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prompt_without_history_is_passthrough() {
        assert_eq!(render_prompt("do the thing", &[], 8), "do the thing");
    }

    #[test]
    fn test_render_prompt_includes_trailing_window_only() {
        let turns: Vec<Turn> = (0..5)
            .map(|i| Turn {
                role: Role::Analyzer,
                text: format!("reply {i}"),
                seq: i,
                payload: None,
            })
            .collect();
        let rendered = render_prompt("next", &turns, 2);
        assert!(!rendered.contains("reply 2"));
        assert!(rendered.contains("reply 3"));
        assert!(rendered.contains("reply 4"));
        assert!(rendered.ends_with("next"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient_error("HTTP 503 Service Unavailable"));
        assert!(is_transient_error("429 Too Many Requests"));
        assert!(is_transient_error("Connection refused"));
        assert!(is_transient_error("operation timed out"));
        assert!(!is_transient_error("401 Unauthorized"));
        assert!(!is_transient_error("invalid request schema"));
    }
}
