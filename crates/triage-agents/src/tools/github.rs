//! GitHub fetcher tools: issue details, repository file listing, file content.

use std::convert::Infallible;

use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::Deserialize;

use crate::github::{parse_issue_url, GithubClient};

// ---------------------------------------------------------------------------
// FetchIssueTool
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct FetchIssueArgs {
    /// Web or API URL of the GitHub issue.
    pub issue_url: String,
}

/// Fetch a GitHub issue's title, state, URL, and body.
pub struct FetchIssueTool {
    client: GithubClient,
}

impl FetchIssueTool {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

impl Tool for FetchIssueTool {
    const NAME: &'static str = "fetch_issue";
    type Error = Infallible;
    type Args = FetchIssueArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: "fetch_issue".into(),
            description: "Fetch GitHub issue details (title, state, URL, body) \
                          given the issue URL."
                .into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "issue_url": {
                        "type": "string",
                        "description": "Web or API URL of the GitHub issue"
                    }
                },
                "required": ["issue_url"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let issue = match parse_issue_url(&args.issue_url) {
            Ok(issue) => issue,
            Err(e) => return Ok(format!("Error fetching issue: {e}")),
        };
        Ok(match self.client.fetch_issue(&issue).await {
            Ok(text) => text,
            Err(e) => format!("Error fetching issue: {e:#}"),
        })
    }
}

// ---------------------------------------------------------------------------
// ListRepoPathsTool
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ListRepoPathsArgs {
    pub owner: String,
    pub repo: String,
}

/// List every file path in the repository (flat, blobs only).
pub struct ListRepoPathsTool {
    client: GithubClient,
}

impl ListRepoPathsTool {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

impl Tool for ListRepoPathsTool {
    const NAME: &'static str = "list_repo_paths";
    type Error = Infallible;
    type Args = ListRepoPathsArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: "list_repo_paths".into(),
            description: "List every file path in the repository at HEAD, one per line.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "owner": {
                        "type": "string",
                        "description": "Repository owner"
                    },
                    "repo": {
                        "type": "string",
                        "description": "Repository name"
                    }
                },
                "required": ["owner", "repo"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        Ok(
            match self.client.list_repo_paths(&args.owner, &args.repo).await {
                Ok(paths) => paths.join("\n"),
                Err(e) => format!("Error fetching repository structure: {e:#}"),
            },
        )
    }
}

// ---------------------------------------------------------------------------
// FetchFileContentTool
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct FetchFileContentArgs {
    pub owner: String,
    pub repo: String,
    /// Path of the file within the repository.
    pub path: String,
}

/// Fetch the content of one file from the repository.
pub struct FetchFileContentTool {
    client: GithubClient,
}

impl FetchFileContentTool {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }
}

impl Tool for FetchFileContentTool {
    const NAME: &'static str = "fetch_file_content";
    type Error = Infallible;
    type Args = FetchFileContentArgs;
    type Output = String;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: "fetch_file_content".into(),
            description: "Fetch the content of a specific file from the repository.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "owner": {
                        "type": "string",
                        "description": "Repository owner"
                    },
                    "repo": {
                        "type": "string",
                        "description": "Repository name"
                    },
                    "path": {
                        "type": "string",
                        "description": "Path of the file within the repository"
                    }
                },
                "required": ["owner", "repo", "path"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        Ok(
            match self
                .client
                .fetch_file_content(&args.owner, &args.repo, &args.path)
                .await
            {
                Ok(content) => format!("Content of {}:\n{content}", args.path),
                Err(e) => format!("Error fetching file {}: {e:#}", args.path),
            },
        )
    }
}
