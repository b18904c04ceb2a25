//! Append-only conversation log for one pipeline run.
//!
//! The controller owns exactly one [`Conversation`] per run. Turns are
//! appended as roles reply and never mutated afterwards; the sequence
//! number is global to the conversation and strictly monotonic.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::contracts::Role;

/// One reply from a role within the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn.
    pub role: Role,
    /// The raw reply text.
    pub text: String,
    /// Position in the conversation, starting at 0 (the coordinator's task).
    pub seq: u64,
    /// Structured payload extracted from the text, when one was accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Ordered, append-only sequence of turns.
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn and return its sequence number.
    pub fn append(&mut self, role: Role, text: impl Into<String>, payload: Option<Value>) -> u64 {
        let seq = self.turns.len() as u64;
        self.turns.push(Turn {
            role,
            text: text.into(),
            seq,
            payload,
        });
        seq
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent turn produced by `role`, if any.
    pub fn last_from(&self, role: Role) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbers_are_monotonic() {
        let mut conv = Conversation::new();
        assert_eq!(conv.append(Role::Coordinator, "task", None), 0);
        assert_eq!(conv.append(Role::Analyzer, "looking", None), 1);
        assert_eq!(conv.append(Role::Analyzer, "found it", None), 2);
        assert_eq!(conv.len(), 3);
        for (i, turn) in conv.turns().iter().enumerate() {
            assert_eq!(turn.seq, i as u64);
        }
    }

    #[test]
    fn test_last_from_picks_most_recent() {
        let mut conv = Conversation::new();
        conv.append(Role::Analyzer, "first", None);
        conv.append(Role::Fixer, "patch", None);
        conv.append(Role::Analyzer, "second", None);
        assert_eq!(conv.last_from(Role::Analyzer).unwrap().text, "second");
        assert!(conv.last_from(Role::Reviewer).is_none());
    }

    #[test]
    fn test_payload_attaches_to_turn() {
        let mut conv = Conversation::new();
        let payload = serde_json::json!({"patch": "diff"});
        conv.append(Role::Fixer, "here", Some(payload.clone()));
        assert_eq!(conv.turns()[0].payload, Some(payload));
    }
}
