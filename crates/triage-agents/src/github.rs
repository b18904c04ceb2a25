//! GitHub issue and repository fetchers.
//!
//! Thin REST wrappers used by the Analyzer's tools. The functions here
//! return `Result` for internal use; the tool layer converts every error
//! into a human-readable reply string (fail closed) so transport problems
//! never surface past a role channel.

use anyhow::{bail, Context as _, Result};
use base64::Engine as _;
use serde_json::Value;

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Coordinates of one GitHub issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

/// Parse a web issue URL (`https://github.com/<owner>/<repo>/issues/<n>`)
/// into its coordinates. API-form URLs
/// (`https://api.github.com/repos/<owner>/<repo>/issues/<n>`) are accepted
/// too, since the agents sometimes echo them back.
pub fn parse_issue_url(url: &str) -> Result<IssueRef> {
    let path = url
        .split("github.com/")
        .nth(1)
        .with_context(|| format!("not a GitHub URL: {url}"))?;

    let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
    // Web form: owner/repo/issues/n. API form: repos/owner/repo/issues/n
    let parts = match parts.as_slice() {
        ["repos", rest @ ..] => rest,
        other => other,
    };

    match parts {
        [owner, repo, "issues", number] => Ok(IssueRef {
            owner: (*owner).to_string(),
            repo: (*repo).to_string(),
            number: number
                .parse()
                .with_context(|| format!("invalid issue number in {url}"))?,
        }),
        _ => bail!("invalid GitHub issue URL: {url}"),
    }
}

/// GitHub REST client. `api_base` is overridable for tests and GHE.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base(DEFAULT_API_BASE, token)
    }

    pub fn with_base(api_base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            token,
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "triage-agents");
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Fetch one issue and format it as the block the analyzer prompt
    /// expects: title, state, URL, body.
    pub async fn fetch_issue(&self, issue: &IssueRef) -> Result<String> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}",
            self.api_base, issue.owner, issue.repo, issue.number
        );
        let data: Value = self
            .get(&url)
            .send()
            .await
            .context("issue request failed")?
            .error_for_status()
            .context("issue request rejected")?
            .json()
            .await
            .context("issue response was not JSON")?;

        Ok(format!(
            "Title: {}\nState: {}\nURL: {}\nBody: {}",
            data["title"].as_str().unwrap_or(""),
            data["state"].as_str().unwrap_or(""),
            data["html_url"].as_str().unwrap_or(""),
            data["body"].as_str().unwrap_or(""),
        ))
    }

    /// Flat list of file paths in the repository (blobs only), from the
    /// recursive tree at HEAD.
    pub async fn list_repo_paths(&self, owner: &str, repo: &str) -> Result<Vec<String>> {
        let url = format!(
            "{}/repos/{owner}/{repo}/git/trees/HEAD?recursive=1",
            self.api_base
        );
        let data: Value = self
            .get(&url)
            .send()
            .await
            .context("tree request failed")?
            .error_for_status()
            .context("tree request rejected")?
            .json()
            .await
            .context("tree response was not JSON")?;

        let tree = data["tree"].as_array().cloned().unwrap_or_default();
        Ok(tree
            .iter()
            .filter(|item| item["type"].as_str() == Some("blob"))
            .filter_map(|item| item["path"].as_str().map(String::from))
            .collect())
    }

    /// Content of a single file, decoded from the contents API's base64.
    pub async fn fetch_file_content(&self, owner: &str, repo: &str, path: &str) -> Result<String> {
        let url = format!("{}/repos/{owner}/{repo}/contents/{path}", self.api_base);
        let data: Value = self
            .get(&url)
            .send()
            .await
            .context("contents request failed")?
            .error_for_status()
            .context("contents request rejected")?
            .json()
            .await
            .context("contents response was not JSON")?;

        if data["encoding"].as_str() != Some("base64") {
            bail!("could not decode file content for {path}");
        }
        // GitHub wraps the base64 body in newlines.
        let raw: String = data["content"]
            .as_str()
            .unwrap_or("")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(raw)
            .context("invalid base64 in contents response")?;
        String::from_utf8(bytes).with_context(|| format!("{path} is not UTF-8"))
    }
}
