//! Typed payload contracts exchanged between pipeline roles.
//!
//! The Analyzer and Fixer reply with JSON embedded in chat text; the
//! controller parses those replies into the structs here before routing
//! anything onward. A payload that fails validation is treated exactly
//! like "no payload found": the turn is incomplete and gets retried.
//!
//! The Reviewer is deliberately *not* structured: it replies with free
//! text plus an approval marker (see [`crate::verdict`]).

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identity of a pipeline participant. Immutable once assigned to a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Submits the initial task; produces no further turns.
    Coordinator,
    /// Fetches issue/repo context and produces an [`AnalyzerPayload`].
    Analyzer,
    /// Produces a diff-formatted [`FixPayload`] from the analysis.
    Fixer,
    /// Judges the patch; replies with free text plus an approval marker.
    Reviewer,
}

impl Role {
    /// Stable lowercase name, used as the artifact-store key segment.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Coordinator => "coordinator",
            Self::Analyzer => "analyzer",
            Self::Fixer => "fixer",
            Self::Reviewer => "reviewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Programming paradigm the Analyzer assigns to the problematic code.
///
/// The wire strings are the exact values the analyzer prompt asks for,
/// including the long-standing "Objected-Oriented" misspelling; changing
/// them would break every deployed prompt. Anything unrecognized
/// (including "Simple Text") folds into `Unclassified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Paradigm {
    #[serde(rename = "Procedural Programming")]
    Procedural,
    #[serde(rename = "Objected-Oriented Programming")]
    ObjectOriented,
    #[serde(rename = "Procedural and Objected-Oriented Programming")]
    ProceduralAndObjectOriented,
    #[serde(other, rename = "Unclassified")]
    Unclassified,
}

/// One file path or several; analyzer replies use both shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FileRef {
    One(String),
    Many(Vec<String>),
}

impl FileRef {
    /// Whether at least one non-blank path is present.
    pub fn has_path(&self) -> bool {
        match self {
            Self::One(p) => !p.trim().is_empty(),
            Self::Many(ps) => ps.iter().any(|p| !p.trim().is_empty()),
        }
    }

    /// The first non-blank path, if any.
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::One(p) if !p.trim().is_empty() => Some(p),
            Self::Many(ps) => ps.iter().map(String::as_str).find(|p| !p.trim().is_empty()),
            _ => None,
        }
    }
}

/// Structured analysis of one issue. All fields are required; a reply
/// missing any of them is not routed to the Fixer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzerPayload {
    /// Clear description of the issue (title + body distilled).
    pub problem_statement: String,
    /// Most likely file(s) containing the bug.
    pub filepath: FileRef,
    /// Paradigm of the affected code.
    pub paradigm: Paradigm,
    /// The analyzer's hypothesis about the root cause.
    pub first_guess: String,
}

impl AnalyzerPayload {
    /// Field-completeness check. serde already rejects missing keys;
    /// this rejects keys that are present but blank, which the wire
    /// format produces when the analyzer gives up on a field.
    pub fn validate(&self) -> Result<(), PayloadIncomplete> {
        if self.problem_statement.trim().is_empty() {
            return Err(PayloadIncomplete::blank("problem_statement"));
        }
        if !self.filepath.has_path() {
            return Err(PayloadIncomplete::blank("filepath"));
        }
        if self.first_guess.trim().is_empty() {
            return Err(PayloadIncomplete::blank("first_guess"));
        }
        Ok(())
    }
}

/// Structured patch produced by the Fixer.
///
/// `problem_statement` is absent from the fixer's own reply; the
/// controller stamps it from the accepted [`AnalyzerPayload`] so the
/// persisted artifact is traceable on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FixPayload {
    /// The change in unified diff format.
    pub patch: String,
    /// Path to the file being patched.
    pub filepath: String,
    /// What the patch does and why.
    pub solution_description: String,
    /// Carried over from the AnalyzerPayload for traceability.
    #[serde(default)]
    pub problem_statement: String,
}

impl FixPayload {
    pub fn validate(&self) -> Result<(), PayloadIncomplete> {
        if self.patch.trim().is_empty() {
            return Err(PayloadIncomplete::blank("patch"));
        }
        if self.filepath.trim().is_empty() {
            return Err(PayloadIncomplete::blank("filepath"));
        }
        if self.solution_description.trim().is_empty() {
            return Err(PayloadIncomplete::blank("solution_description"));
        }
        Ok(())
    }
}

/// A payload parsed but failed required-field validation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("payload field `{field}` is missing or blank")]
pub struct PayloadIncomplete {
    pub field: &'static str,
}

impl PayloadIncomplete {
    fn blank(field: &'static str) -> Self {
        Self { field }
    }
}
