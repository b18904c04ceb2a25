//! Pipeline state machine: explicit states and legal transition guards.
//!
//! The controller loop calls `advance()` to move between states. Each call
//! validates the transition against the state graph and records it in the
//! transition log, so every run's path is auditable after the fact.
//!
//! Every run starts at `AwaitingAnalysis` and terminates at exactly one of
//! `Approved`, `Exhausted`, or `Aborted`; there is no hung outcome.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// The set of pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Waiting for the Analyzer to produce a complete analysis payload.
    AwaitingAnalysis,
    /// Waiting for the Fixer to produce a complete patch payload.
    AwaitingFix,
    /// Waiting for the Reviewer's verdict on the current patch.
    AwaitingReview,
    /// Reviewer approved the patch. Terminal success.
    Approved,
    /// Round budget spent without approval. Terminal failure.
    Exhausted,
    /// Analysis never converged, retries exceeded, or cancelled. Terminal error.
    Aborted,
}

impl PipelineState {
    /// Whether this is a terminal state (no further transitions allowed).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Exhausted | Self::Aborted)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingAnalysis => write!(f, "AwaitingAnalysis"),
            Self::AwaitingFix => write!(f, "AwaitingFix"),
            Self::AwaitingReview => write!(f, "AwaitingReview"),
            Self::Approved => write!(f, "Approved"),
            Self::Exhausted => write!(f, "Exhausted"),
            Self::Aborted => write!(f, "Aborted"),
        }
    }
}

/// Legal transitions between pipeline states.
///
/// ```text
/// AwaitingAnalysis → AwaitingFix | Aborted
/// AwaitingFix      → AwaitingReview | Aborted
/// AwaitingReview   → AwaitingFix | Approved | Exhausted | Aborted
/// ```
fn is_legal_transition(from: PipelineState, to: PipelineState) -> bool {
    use PipelineState::*;

    // Any non-terminal state can abort.
    if to == Aborted && !from.is_terminal() {
        return true;
    }

    matches!(
        (from, to),
        (AwaitingAnalysis, AwaitingFix)
            | (AwaitingFix, AwaitingReview)
            // Reviewer verdict: approve, send back for another round, or
            // run out of rounds.
            | (AwaitingReview, Approved)
            | (AwaitingReview, AwaitingFix)
            | (AwaitingReview, Exhausted)
    )
}

/// A single recorded state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The state transitioned from.
    pub from: PipelineState,
    /// The state transitioned to.
    pub to: PipelineState,
    /// Fixer→Reviewer round number at the time of transition (0 before
    /// the first fix round).
    pub round: u32,
    /// Milliseconds since the state machine was created.
    pub elapsed_ms: u64,
    /// Optional context about why this transition happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Error returned when an illegal transition is attempted.
#[derive(Debug, Clone, thiserror::Error)]
#[error("illegal state transition: {from} → {to}")]
pub struct IllegalTransition {
    pub from: PipelineState,
    pub to: PipelineState,
}

/// Tracks the current state, enforces legal transitions, and keeps a
/// complete transition log for diagnostics.
pub struct StateMachine {
    current: PipelineState,
    round: u32,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
}

impl StateMachine {
    /// Create a state machine starting at `AwaitingAnalysis`.
    pub fn new() -> Self {
        Self {
            current: PipelineState::AwaitingAnalysis,
            round: 0,
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> PipelineState {
        self.current
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Set the round counter (called by the controller loop).
    pub fn set_round(&mut self, round: u32) {
        self.round = round;
    }

    /// Attempt to advance to the next state.
    pub fn advance(
        &mut self,
        to: PipelineState,
        reason: Option<&str>,
    ) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }

        let record = TransitionRecord {
            from: self.current,
            to,
            round: self.round,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            reason: reason.map(String::from),
        };

        tracing::debug!(
            from = %self.current,
            to = %to,
            round = self.round,
            "state transition"
        );

        self.transitions.push(record);
        self.current = to;
        Ok(())
    }

    /// Transition to `Aborted` from any non-terminal state.
    pub fn abort(&mut self, reason: &str) -> Result<(), IllegalTransition> {
        self.advance(PipelineState::Aborted, Some(reason))
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// One-line summary of the machine's history.
    pub fn summary(&self) -> String {
        let states: Vec<String> = self.transitions.iter().map(|t| t.to.to_string()).collect();
        format!(
            "{} → {} ({}ms, {} transitions)",
            PipelineState::AwaitingAnalysis,
            self.current,
            self.created_at.elapsed().as_millis(),
            self.transitions.len(),
        ) + if states.is_empty() {
            String::new()
        } else {
            format!(" [{}]", states.join(" → "))
        }
        .as_str()
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let sm = StateMachine::new();
        assert_eq!(sm.current(), PipelineState::AwaitingAnalysis);
        assert!(!sm.is_terminal());
        assert_eq!(sm.transitions().len(), 0);
    }

    #[test]
    fn test_happy_path_first_round_approval() {
        let mut sm = StateMachine::new();
        sm.advance(PipelineState::AwaitingFix, Some("analysis complete"))
            .unwrap();
        sm.set_round(1);
        sm.advance(PipelineState::AwaitingReview, None).unwrap();
        sm.advance(PipelineState::Approved, Some("marker found"))
            .unwrap();

        assert!(sm.is_terminal());
        assert_eq!(sm.current(), PipelineState::Approved);
        assert_eq!(sm.transitions().len(), 3);
    }

    #[test]
    fn test_review_feedback_loops_back_to_fix() {
        let mut sm = StateMachine::new();
        sm.advance(PipelineState::AwaitingFix, None).unwrap();
        sm.set_round(1);
        sm.advance(PipelineState::AwaitingReview, None).unwrap();
        sm.advance(PipelineState::AwaitingFix, Some("not approved"))
            .unwrap();
        sm.set_round(2);
        sm.advance(PipelineState::AwaitingReview, None).unwrap();
        sm.advance(PipelineState::Approved, None).unwrap();

        assert!(sm.is_terminal());
        assert_eq!(sm.transitions().len(), 5);
    }

    #[test]
    fn test_budget_out_reaches_exhausted() {
        let mut sm = StateMachine::new();
        sm.advance(PipelineState::AwaitingFix, None).unwrap();
        sm.advance(PipelineState::AwaitingReview, None).unwrap();
        sm.advance(PipelineState::Exhausted, Some("round budget spent"))
            .unwrap();
        assert!(sm.is_terminal());
        assert_eq!(sm.current(), PipelineState::Exhausted);
    }

    #[test]
    fn test_abort_from_any_non_terminal_state() {
        for state in [
            PipelineState::AwaitingAnalysis,
            PipelineState::AwaitingFix,
            PipelineState::AwaitingReview,
        ] {
            let mut sm = StateMachine {
                current: state,
                round: 0,
                created_at: Instant::now(),
                transitions: Vec::new(),
            };
            assert!(sm.abort("test abort").is_ok());
            assert_eq!(sm.current(), PipelineState::Aborted);
        }
    }

    #[test]
    fn test_cannot_transition_from_terminal() {
        let mut sm = StateMachine::new();
        sm.advance(PipelineState::AwaitingFix, None).unwrap();
        sm.advance(PipelineState::AwaitingReview, None).unwrap();
        sm.advance(PipelineState::Approved, None).unwrap();

        let err = sm.advance(PipelineState::AwaitingFix, None).unwrap_err();
        assert_eq!(err.from, PipelineState::Approved);
        assert_eq!(err.to, PipelineState::AwaitingFix);

        // Cannot abort from terminal either.
        assert!(sm.abort("nope").is_err());
    }

    #[test]
    fn test_illegal_skip_transition() {
        let mut sm = StateMachine::new();
        // Can't go straight to review without a fix payload.
        assert!(sm.advance(PipelineState::AwaitingReview, None).is_err());
        // Can't approve out of analysis.
        assert!(sm.advance(PipelineState::Approved, None).is_err());
    }

    #[test]
    fn test_illegal_backward_transition() {
        let mut sm = StateMachine::new();
        sm.advance(PipelineState::AwaitingFix, None).unwrap();
        assert!(sm.advance(PipelineState::AwaitingAnalysis, None).is_err());
    }

    #[test]
    fn test_transition_record_has_reason_and_round() {
        let mut sm = StateMachine::new();
        sm.set_round(0);
        sm.advance(PipelineState::AwaitingFix, Some("analysis complete"))
            .unwrap();
        let record = &sm.transitions()[0];
        assert_eq!(record.from, PipelineState::AwaitingAnalysis);
        assert_eq!(record.to, PipelineState::AwaitingFix);
        assert_eq!(record.reason.as_deref(), Some("analysis complete"));
        assert_eq!(record.round, 0);
    }

    #[test]
    fn test_transition_record_serde_roundtrip() {
        let record = TransitionRecord {
            from: PipelineState::AwaitingReview,
            to: PipelineState::Exhausted,
            round: 2,
            elapsed_ms: 4242,
            reason: Some("round budget spent".into()),
        };
        let json = serde_json::to_string(&record).unwrap();
        let restored: TransitionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.from, PipelineState::AwaitingReview);
        assert_eq!(restored.to, PipelineState::Exhausted);
        assert_eq!(restored.round, 2);
        assert_eq!(restored.elapsed_ms, 4242);
    }

    #[test]
    fn test_summary() {
        let mut sm = StateMachine::new();
        sm.advance(PipelineState::AwaitingFix, None).unwrap();
        sm.abort("test").unwrap();
        let summary = sm.summary();
        assert!(summary.contains("Aborted"));
        assert!(summary.contains("2 transitions"));
    }
}
