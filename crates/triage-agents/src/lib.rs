//! Agent pipeline that drives three LLM roles (Analyzer, Fixer, Reviewer)
//! through a bounded, ordered, retryable conversation over a GitHub issue
//! until the reviewer approves a patch or the round budget runs out.
//!
//! The public surface is small: build a [`roles::RoleSet`] from a
//! [`config::PipelineConfig`], hand both to a
//! [`pipeline::PipelineController`] together with an
//! [`artifacts::ArtifactStore`], and call `run()`.

pub mod artifacts;
pub mod config;
pub mod contracts;
pub mod conversation;
pub mod extract;
pub mod github;
pub mod pipeline;
pub mod prompts;
pub mod roles;
pub mod state_machine;
pub mod tools;
pub mod verdict;
