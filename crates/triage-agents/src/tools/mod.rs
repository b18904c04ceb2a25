//! Rig-compatible tools for the Analyzer agent.
//!
//! Each tool implements `rig::tool::Tool` and is attached via
//! `AgentBuilder::tool()`. All of them fail closed: a transport or parse
//! error comes back as explanatory reply text ("Error fetching issue: …"),
//! never as a tool error, so the controller's state machine needs no
//! tool-failure path.

pub mod github;

pub use github::{FetchFileContentTool, FetchIssueTool, ListRepoPathsTool};
