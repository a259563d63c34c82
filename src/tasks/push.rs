//! tasks::push
//!
//! Push branches and tags to a remote.
//!
//! Every name becomes a `<ref>:<ref>` refspec. Branch names are
//! canonicalized like commit targets; tag names prefer the tag namespace.
//! The report is `changed` only when the remote moved at least one ref.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use super::{join_paths, open_repo, Task, TaskError, TaskReport};
use crate::core::resolve;
use crate::core::types::{Credentials, RefName};
use crate::git::{Git, GitError};

#[derive(Debug, Clone, Default)]
pub struct PushTask {
    pub path: PathBuf,
    /// Remote name; the configured remote (`origin`) when absent
    pub remote: Option<String>,
    pub branches: Vec<String>,
    pub tags: Vec<String>,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushPayload {
    pub remote: String,
    pub refspecs: Vec<String>,
}

fn tag_ref(git: &Git, tag: &str) -> Result<RefName, TaskError> {
    if let Some(found) = resolve::dwim(git, tag)? {
        if found.is_tag_ref() {
            return Ok(found);
        }
    }
    if tag.starts_with("refs/") {
        return Ok(RefName::new(tag).map_err(GitError::from)?);
    }
    Ok(RefName::for_tag(tag).map_err(GitError::from)?)
}

impl Task for PushTask {
    const NAME: &'static str = "push";
    type Payload = PushPayload;

    fn run(&self) -> Result<TaskReport<PushPayload>, TaskError> {
        if self.branches.is_empty() && self.tags.is_empty() {
            return Err(TaskError::invalid_state(
                "either branch or tags must be defined",
            ));
        }

        let (git, config) = open_repo(&self.path)?;
        let remote = self
            .remote
            .clone()
            .unwrap_or_else(|| config.remote().to_string());
        if git.remote_url(&remote)?.is_none() {
            return Err(TaskError::not_found(format!(
                "failed to get remote {}",
                remote
            )));
        }

        let mut refspecs = Vec::new();
        for branch in &self.branches {
            let refname = resolve::canonicalize(&git, &config, Some(branch.as_str()))?;
            refspecs.push(format!("{0}:{0}", refname));
        }
        for tag in &self.tags {
            refspecs.push(format!("{0}:{0}", tag_ref(&git, tag)?));
        }

        let summary = git
            .push(&remote, &refspecs, &self.credentials)
            .map_err(|e| match e {
                GitError::RemoteNotFound { name } => {
                    TaskError::not_found(format!("failed to get remote {}", name))
                }
                other => TaskError::TransportFailure {
                    message: format!("failed to push refs {} to {}", join_paths(&refspecs), remote),
                    cause: other.to_string(),
                },
            })?;

        let payload = PushPayload {
            remote: remote.clone(),
            refspecs,
        };
        if !summary.changed() {
            return Ok(TaskReport::unchanged(
                format!("{} already up to date", remote),
                payload,
            ));
        }

        info!(%remote, updated = ?summary.updated, "pushed");
        Ok(TaskReport::changed(
            format!("pushed {} to {}", join_paths(&summary.updated), remote),
            payload,
        ))
    }
}
