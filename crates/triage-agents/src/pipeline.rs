//! Pipeline controller: sequences role turns, applies the retry and
//! termination policy, routes structured payloads between roles, and
//! enforces the round budget.
//!
//! One controller drives one run, strictly sequentially: a role's output
//! is the next role's input, so there is never more than one outstanding
//! `produce_reply` per run. Independent runs share nothing but the
//! [`ArtifactStore`].
//!
//! Every path through the loop ends in exactly one of `Approved`,
//! `Exhausted`, or `Aborted`; whatever artifacts were persisted before the
//! terminal state stay retrievable.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::artifacts::{ArtifactStore, RunId};
use crate::config::PipelineConfig;
use crate::contracts::{AnalyzerPayload, FixPayload, Role};
use crate::conversation::Conversation;
use crate::extract::extract_payload;
use crate::prompts;
use crate::roles::RoleSet;
use crate::state_machine::{PipelineState, StateMachine, TransitionRecord};
use crate::verdict;

/// Counter of Fixer→Reviewer exchanges remaining. Decremented exactly once
/// per reviewer non-approval, never on analyzer or fixer retries.
#[derive(Debug, Clone, Copy)]
pub struct RoundBudget {
    remaining: u32,
}

impl RoundBudget {
    pub fn new(rounds: u32) -> Self {
        Self { remaining: rounds }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Consume one round and return how many remain.
    pub fn spend(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }
}

/// What the caller gets back from a finished run. `status` is always
/// terminal; the payload fields hold whatever was successfully produced
/// before that status was reached.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub status: PipelineState,
    pub analyzer_payload: Option<AnalyzerPayload>,
    pub fix_payload: Option<FixPayload>,
    /// The reviewer's last reply: the approval turn on success, the
    /// final unapproved verdict on exhaustion.
    pub final_verdict: Option<String>,
    pub transitions: Vec<TransitionRecord>,
    /// Total turns appended to the conversation.
    pub turns: usize,
}

/// The state machine driver for one pipeline run.
pub struct PipelineController {
    run_id: RunId,
    roles: RoleSet,
    store: Arc<ArtifactStore>,
    machine: StateMachine,
    conversation: Conversation,
    budget: RoundBudget,
    analyzer_turn_budget: u32,
    fix_retry_cap: u32,
    reply_timeout: Duration,
    cancel: CancellationToken,
    analyzer_payload: Option<AnalyzerPayload>,
    fix_payload: Option<FixPayload>,
    final_verdict: Option<String>,
}

impl PipelineController {
    pub fn new(
        run_id: RunId,
        roles: RoleSet,
        store: Arc<ArtifactStore>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            run_id,
            roles,
            store,
            machine: StateMachine::new(),
            conversation: Conversation::new(),
            budget: RoundBudget::new(config.round_budget),
            analyzer_turn_budget: config.analyzer_turn_budget,
            fix_retry_cap: config.fix_retry_cap,
            reply_timeout: config.reply_timeout,
            cancel: CancellationToken::new(),
            analyzer_payload: None,
            fix_payload: None,
            final_verdict: None,
        }
    }

    /// Attach a cancellation token. Cancellation takes effect at state
    /// boundaries only, never mid `produce_reply` call.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Drive the run to a terminal state. The conversation begins with the
    /// coordinator's task turn.
    pub async fn run(mut self, task: &str) -> Result<PipelineOutcome> {
        info!(run = %self.run_id, rounds = self.budget.remaining(), "pipeline run starting");
        self.conversation.append(Role::Coordinator, task, None);

        // --- AwaitingAnalysis -------------------------------------------
        let analysis = match self.analysis_phase(task).await {
            Ok(payload) => payload,
            Err(reason) => return self.abort(&reason),
        };
        self.store
            .put(&self.run_id, Role::Analyzer, serde_json::to_value(&analysis)?)?;
        self.analyzer_payload = Some(analysis.clone());
        self.machine
            .advance(PipelineState::AwaitingFix, Some("analysis complete"))?;

        // --- Fix / Review rounds ----------------------------------------
        let mut fix_prompt = fix_task_prompt(&analysis)?;
        let mut round = 1u32;
        loop {
            self.machine.set_round(round);
            if self.cancel.is_cancelled() {
                return self.abort("cancelled");
            }

            let fix = match self.fix_phase(&fix_prompt, &analysis).await {
                Ok(payload) => payload,
                Err(reason) => return self.abort(&reason),
            };
            self.store
                .put(&self.run_id, Role::Fixer, serde_json::to_value(&fix)?)?;
            self.fix_payload = Some(fix.clone());
            self.machine
                .advance(PipelineState::AwaitingReview, Some("patch payload accepted"))?;

            if self.cancel.is_cancelled() {
                return self.abort("cancelled");
            }

            let reply = self.await_reply(Role::Reviewer, &review_prompt(&fix)).await;
            self.conversation.append(Role::Reviewer, reply.clone(), None);
            self.final_verdict = Some(reply.clone());

            if verdict::is_approved(&reply) {
                info!(run = %self.run_id, round, "reviewer approved patch");
                self.machine
                    .advance(PipelineState::Approved, Some("approval marker found"))?;
                return Ok(self.finish());
            }

            let remaining = self.budget.spend();
            info!(run = %self.run_id, round, remaining, "reviewer requested changes");
            if remaining == 0 {
                self.machine
                    .advance(PipelineState::Exhausted, Some("round budget spent"))?;
                return Ok(self.finish());
            }

            self.machine
                .advance(PipelineState::AwaitingFix, Some("reviewer feedback routed to fixer"))?;
            fix_prompt = fix_feedback_prompt(&reply);
            round += 1;
        }
    }

    /// Analyzer turns until a complete payload appears or the turn budget
    /// runs out. The sub-budget is distinct from the round budget: these
    /// turns gather information, they are not retries of a decision.
    async fn analysis_phase(&mut self, task: &str) -> Result<AnalyzerPayload, String> {
        for attempt in 0..self.analyzer_turn_budget {
            if self.cancel.is_cancelled() {
                return Err("cancelled".into());
            }

            let prompt = if attempt == 0 {
                task
            } else {
                prompts::ANALYZER_CLARIFY
            };
            let reply = self.await_reply(Role::Analyzer, prompt).await;

            match complete_analysis(&reply) {
                Some(payload) => {
                    let value = serde_json::to_value(&payload).ok();
                    self.conversation.append(Role::Analyzer, reply, value);
                    info!(run = %self.run_id, attempt, "analysis payload accepted");
                    return Ok(payload);
                }
                None => {
                    warn!(run = %self.run_id, attempt, "analyzer reply incomplete");
                    self.conversation.append(Role::Analyzer, reply, None);
                }
            }
        }
        Err("analysis incomplete".into())
    }

    /// One fix round: initial attempt plus up to `fix_retry_cap` retries
    /// with the same input. Retries never consume the round budget.
    async fn fix_phase(
        &mut self,
        prompt: &str,
        analysis: &AnalyzerPayload,
    ) -> Result<FixPayload, String> {
        for attempt in 0..=self.fix_retry_cap {
            if self.cancel.is_cancelled() {
                return Err("cancelled".into());
            }

            let reply = self.await_reply(Role::Fixer, prompt).await;

            match complete_fix(&reply, analysis) {
                Some(payload) => {
                    let value = serde_json::to_value(&payload).ok();
                    self.conversation.append(Role::Fixer, reply, value);
                    info!(run = %self.run_id, attempt, "fix payload accepted");
                    return Ok(payload);
                }
                None => {
                    warn!(run = %self.run_id, attempt, "fixer reply incomplete");
                    self.conversation.append(Role::Fixer, reply, None);
                }
            }
        }
        Err("fixer payload never completed".into())
    }

    /// Time-bounded `produce_reply`. A timeout yields a synthetic empty
    /// reply, which downstream handling treats exactly like a malformed
    /// one.
    async fn await_reply(&self, role: Role, prompt: &str) -> String {
        let channel = self.roles.channel(role);
        match tokio::time::timeout(
            self.reply_timeout,
            channel.produce_reply(prompt, self.conversation.turns()),
        )
        .await
        {
            Ok(reply) => reply,
            Err(_) => {
                warn!(
                    run = %self.run_id,
                    role = %role,
                    timeout_secs = self.reply_timeout.as_secs(),
                    "reply timed out"
                );
                format!("[no reply from {role} within {}s]", self.reply_timeout.as_secs())
            }
        }
    }

    fn abort(mut self, reason: &str) -> Result<PipelineOutcome> {
        warn!(run = %self.run_id, reason, "pipeline run aborted");
        self.machine.abort(reason)?;
        Ok(self.finish())
    }

    fn finish(self) -> PipelineOutcome {
        info!(run = %self.run_id, summary = %self.machine.summary(), "pipeline run finished");
        PipelineOutcome {
            status: self.machine.current(),
            analyzer_payload: self.analyzer_payload,
            fix_payload: self.fix_payload,
            final_verdict: self.final_verdict,
            transitions: self.machine.transitions().to_vec(),
            turns: self.conversation.len(),
        }
    }
}

/// Parse and validate an analyzer reply. `None` covers the whole
/// recoverable spectrum: no braces, malformed JSON, missing fields, blank
/// fields all mean "no payload found" to the controller.
fn complete_analysis(reply: &str) -> Option<AnalyzerPayload> {
    let payload: AnalyzerPayload = extract_payload(reply).ok()?;
    payload.validate().ok()?;
    Some(payload)
}

/// Parse and validate a fixer reply, stamping the problem statement from
/// the accepted analysis for traceability.
fn complete_fix(reply: &str, analysis: &AnalyzerPayload) -> Option<FixPayload> {
    let mut payload: FixPayload = extract_payload(reply).ok()?;
    payload.validate().ok()?;
    payload.problem_statement = analysis.problem_statement.clone();
    Some(payload)
}

/// First-round fixer prompt: the full analysis object.
fn fix_task_prompt(analysis: &AnalyzerPayload) -> Result<String> {
    let json = serde_json::to_string_pretty(&serde_json::to_value(analysis)?)?;
    Ok(format!(
        "Here is the analysis of the issue. Produce a patch for it.\n\n{json}"
    ))
}

/// Subsequent-round fixer prompt: the reviewer's feedback.
fn fix_feedback_prompt(feedback: &str) -> String {
    format!(
        "The reviewer did not approve your previous patch. Address this \
         feedback and produce a corrected patch:\n\n{feedback}"
    )
}

/// Reviewer prompt: problem statement plus patch, nothing else.
fn review_prompt(fix: &FixPayload) -> String {
    format!(
        "Please review this code patch.\n\nPROBLEM STATEMENT:\n{}\n\nCODE PATCH:\n{}\n\n\
         DESCRIPTION:\n{}",
        fix.problem_statement, fix.patch, fix.solution_description
    )
}

/// JSON document summarizing an outcome, printed by the CLI.
pub fn outcome_to_json(outcome: &PipelineOutcome) -> Value {
    serde_json::json!({
        "status": outcome.status,
        "analyzer_payload": outcome.analyzer_payload,
        "fix_payload": outcome.fix_payload,
        "final_verdict": outcome.final_verdict,
        "rounds": outcome.transitions.last().map(|t| t.round).unwrap_or(0),
        "turns": outcome.turns,
    })
}
