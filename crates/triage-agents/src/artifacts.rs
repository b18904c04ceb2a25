//! Latest-wins artifact store, keyed by (run, role).
//!
//! Each run persists at most two documents: the current analyzer payload
//! and the current fix payload. A new write for the same key replaces the
//! old value. No history, matching the one-active-payload invariant.
//!
//! The store is shared across concurrent runs. The in-memory index is a
//! `RwLock<HashMap>`; the on-disk mirror (`<root>/<run_id>/<role>_output.json`)
//! is written via temp-file-plus-rename so an external reader never sees a
//! partially written document. Artifacts are never deleted on abort; they
//! stay available for inspection.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context as _, Result};
use serde_json::Value;
use tracing::debug;

use crate::contracts::Role;

/// Identifier for one pipeline run. Artifact keys and the on-disk layout
/// are scoped by this, so independent runs never interfere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    /// Derive a run id from the issue coordinates, e.g. `owner-repo-17`.
    pub fn from_issue(owner: &str, repo: &str, number: u64) -> Self {
        Self(format!("{owner}-{repo}-{number}"))
    }

    /// Timestamped run id for tasks with no issue coordinates.
    pub fn now() -> Self {
        Self(format!(
            "run-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%3f")
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared artifact store. Cheap to clone behind an `Arc` by the caller.
pub struct ArtifactStore {
    root: PathBuf,
    index: RwLock<HashMap<(RunId, Role), Value>>,
}

impl ArtifactStore {
    /// Create a store rooted at `root`. The directory is created lazily
    /// on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: RwLock::new(HashMap::new()),
        }
    }

    /// Persist `value` as the latest payload for (run, role), replacing
    /// any prior value for the same key.
    pub fn put(&self, run: &RunId, role: Role, value: Value) -> Result<()> {
        self.write_document(run, role, &value)?;
        let mut index = self.index.write().expect("artifact index poisoned");
        index.insert((run.clone(), role), value);
        debug!(run = %run, role = %role, "artifact persisted");
        Ok(())
    }

    /// The latest payload for (run, role), or `None` if never written.
    pub fn get(&self, run: &RunId, role: Role) -> Option<Value> {
        let index = self.index.read().expect("artifact index poisoned");
        index.get(&(run.clone(), role)).cloned()
    }

    /// Path of the on-disk document for (run, role).
    pub fn document_path(&self, run: &RunId, role: Role) -> PathBuf {
        self.root
            .join(run.as_str())
            .join(format!("{}_output.json", role.as_str()))
    }

    fn write_document(&self, run: &RunId, role: Role, value: &Value) -> Result<()> {
        let path = self.document_path(run, role);
        let dir = path.parent().expect("document path has a parent");
        fs::create_dir_all(dir)
            .with_context(|| format!("creating artifact dir {}", dir.display()))?;

        // Write to a sibling temp file, then rename. Rename within one
        // directory is atomic, so readers see old-or-new, never partial.
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(value)?;
        fs::write(&tmp, body)
            .with_context(|| format!("writing artifact {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("publishing artifact {}", path.display()))?;
        Ok(())
    }
}

/// Read a previously persisted document back from disk. Used by external
/// tooling between runs; the running pipeline itself uses the in-memory
/// index.
pub fn read_document(path: &Path) -> Result<Value> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("reading artifact {}", path.display()))?;
    Ok(serde_json::from_str(&body)?)
}
