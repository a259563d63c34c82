//! tasks::commit
//!
//! Commit the index to a branch when something is staged.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::{open_repo, Task, TaskError, TaskReport};
use crate::core::types::{Identity, Oid, RefName};
use crate::engine::{self, CommitOutcome};

#[derive(Debug, Clone, Default)]
pub struct CommitTask {
    pub path: PathBuf,
    /// Target branch; the current branch (or the default branch of an
    /// unborn repository) when absent
    pub branch: Option<String>,
    pub message: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitPayload {
    /// The new commit; absent when nothing was committed
    pub commit: Option<Oid>,
    pub refname: RefName,
    pub parents: Vec<Oid>,
    pub time: Option<DateTime<Utc>>,
}

impl Task for CommitTask {
    const NAME: &'static str = "commit";
    type Payload = CommitPayload;

    fn run(&self) -> Result<TaskReport<CommitPayload>, TaskError> {
        let (git, config) = open_repo(&self.path)?;

        let defaults = config.identity();
        let author = Identity::new(
            self.author.clone().unwrap_or(defaults.name),
            self.email.clone().unwrap_or(defaults.email),
        );
        let message = self
            .message
            .as_deref()
            .unwrap_or_else(|| config.commit_message());

        let target = engine::derive_target(&git, &config, self.branch.as_deref())?;
        match engine::create_commit(&git, target, message, &author)? {
            CommitOutcome::NothingStaged { target } => Ok(TaskReport::unchanged(
                "no files staged for commit",
                CommitPayload {
                    commit: None,
                    refname: target.refname,
                    parents: target.parents,
                    time: None,
                },
            )),
            CommitOutcome::Created { id, target } => {
                let info = git.commit_info(&id)?;
                info!(commit = %id, refname = %target.refname, "committed");
                Ok(TaskReport::changed(
                    format!("committed {} to {}", id, target.refname),
                    CommitPayload {
                        commit: Some(id),
                        refname: target.refname,
                        parents: info.parents,
                        time: Some(info.time),
                    },
                ))
            }
        }
    }
}
