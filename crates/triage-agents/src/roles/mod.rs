//! Role channels: one participant each for Analyzer, Fixer, and Reviewer.
//!
//! The controller only ever talks to the [`RoleChannel`] trait. The rig
//! implementations live in [`channel`]; the per-role agent builders are in
//! their own modules. `RoleSet` ties them together from a
//! [`PipelineConfig`](crate::config::PipelineConfig), the way a factory
//! would: resolved at composition time, never by runtime probing.

pub mod analyzer;
pub mod channel;
pub mod fixer;
pub mod reviewer;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{ClientSet, PipelineConfig};
use crate::contracts::Role;
use crate::conversation::Turn;
use crate::github::GithubClient;
use channel::RigChannel;

/// One pipeline participant, capable of producing a reply given a prompt
/// and the conversation so far.
///
/// The interface is deterministic: a channel always returns text and never
/// errors past its boundary. Upstream transport or provider failures are
/// caught inside the implementation and surfaced as explanatory reply text,
/// so the controller needs no tool-failure state. The channel may perform
/// any number of side calls (issue fetch, file reads) while generating the
/// reply; the controller only observes the final text.
#[async_trait]
pub trait RoleChannel: Send + Sync {
    async fn produce_reply(&self, prompt: &str, history: &[Turn]) -> String;
}

/// The three producing channels of one pipeline (the Coordinator only ever
/// submits the opening task and needs no channel).
pub struct RoleSet {
    pub analyzer: Arc<dyn RoleChannel>,
    pub fixer: Arc<dyn RoleChannel>,
    pub reviewer: Arc<dyn RoleChannel>,
}

impl RoleSet {
    /// Build all three rig-backed channels from the config.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let clients = ClientSet::from_config(config)?;
        let github = GithubClient::new(config.github_token.clone());

        let analyzer = analyzer::build_analyzer(&clients.completions, &config.model, github);
        let fixer = fixer::build_fixer(&clients.completions, &config.model);
        let reviewer = reviewer::build_reviewer(&clients.completions, &config.model);

        Ok(Self {
            analyzer: Arc::new(RigChannel::new(Role::Analyzer, analyzer)),
            fixer: Arc::new(RigChannel::new(Role::Fixer, fixer)),
            reviewer: Arc::new(RigChannel::new(Role::Reviewer, reviewer)),
        })
    }

    /// The channel for a producing role. Panics for `Coordinator`, which
    /// never produces replies.
    pub fn channel(&self, role: Role) -> &Arc<dyn RoleChannel> {
        match role {
            Role::Analyzer => &self.analyzer,
            Role::Fixer => &self.fixer,
            Role::Reviewer => &self.reviewer,
            Role::Coordinator => unreachable!("coordinator has no reply channel"),
        }
    }
}
