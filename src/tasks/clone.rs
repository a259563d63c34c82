//! tasks::clone
//!
//! Clone an upstream unless the destination is already a repository.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use super::{normalize_repo_path, Task, TaskError, TaskReport};
use crate::core::types::{BranchName, Credentials};
use crate::git::{Git, GitError};

#[derive(Debug, Clone)]
pub struct CloneTask {
    pub upstream: String,
    pub path: PathBuf,
    pub bare: bool,
    /// Branch to check out instead of the upstream's HEAD
    pub branch: Option<String>,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClonePayload {
    pub repo: PathBuf,
    pub upstream: String,
}

/// Absolute local paths become `file://` URLs.
pub fn upstream_url(upstream: &str) -> String {
    if upstream.starts_with('/') {
        format!("file://{}", upstream)
    } else {
        upstream.to_string()
    }
}

impl Task for CloneTask {
    const NAME: &'static str = "clone";
    type Payload = ClonePayload;

    fn run(&self) -> Result<TaskReport<ClonePayload>, TaskError> {
        let repo = normalize_repo_path(&self.path)?;
        let upstream = upstream_url(self.upstream.trim());
        let payload = ClonePayload {
            repo: repo.clone(),
            upstream: upstream.clone(),
        };

        if Git::open_exact(&repo).is_ok() {
            return Ok(TaskReport::unchanged(
                format!("repository exists at {}", repo.display()),
                payload,
            ));
        }

        let branch = self
            .branch
            .as_deref()
            .map(BranchName::new)
            .transpose()
            .map_err(|e| TaskError::invalid_state(e.to_string()))?;

        match Git::clone(&upstream, &repo, self.bare, branch.as_ref(), &self.credentials) {
            Ok(_) => {}
            Err(GitError::RefNotFound { .. }) => {
                return Err(TaskError::not_found(format!(
                    "branch {} does not exist in {}",
                    self.branch.as_deref().unwrap_or_default(),
                    upstream
                )))
            }
            Err(e) => {
                return Err(TaskError::TransportFailure {
                    message: format!("failed clone {} to {}", upstream, repo.display()),
                    cause: e.to_string(),
                })
            }
        }

        info!(%upstream, repo = %repo.display(), "cloned");
        Ok(TaskReport::changed(
            format!("cloned {} at {}", upstream, repo.display()),
            payload,
        ))
    }
}
