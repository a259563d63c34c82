//! tasks::branch
//!
//! Create or delete a local branch.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use super::{open_repo, Action, Task, TaskError, TaskReport};
use crate::core::resolve;
use crate::core::types::{BranchName, RefName};

#[derive(Debug, Clone)]
pub struct BranchTask {
    pub path: PathBuf,
    pub action: Action,
    pub name: Option<String>,
    /// Ref-ish the new branch starts at; `HEAD` when absent
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchPayload {
    pub branch: BranchName,
}

impl Task for BranchTask {
    const NAME: &'static str = "branch";
    type Payload = BranchPayload;

    fn run(&self) -> Result<TaskReport<BranchPayload>, TaskError> {
        let name = match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(TaskError::invalid_state(match self.action {
                    Action::Add => "a branch name is required to add a branch",
                    Action::Delete => "a branch name is required to delete a branch",
                }))
            }
        };
        let branch = BranchName::new(name).map_err(|e| TaskError::invalid_state(e.to_string()))?;

        let (git, _config) = open_repo(&self.path)?;
        let exists = git.ref_exists(RefName::for_branch(&branch).as_str());
        let payload = BranchPayload {
            branch: branch.clone(),
        };

        match (self.action, exists) {
            (Action::Delete, false) => Ok(TaskReport::unchanged(
                format!("branch {} does not exist", branch),
                payload,
            )),
            (Action::Delete, true) => {
                git.delete_branch(&branch)?;
                info!(%branch, "deleted branch");
                Ok(TaskReport::changed(
                    format!("branch {} deleted", branch),
                    payload,
                ))
            }
            (Action::Add, true) => Ok(TaskReport::unchanged(
                format!("branch {} already exists", branch),
                payload,
            )),
            (Action::Add, false) => {
                let parent = self.parent.as_deref().unwrap_or(RefName::HEAD);
                let start = resolve::resolve(&git, parent)?.ok_or_else(|| {
                    TaskError::not_found(format!(
                        "{} not found in {}",
                        parent,
                        self.path.display()
                    ))
                })?;
                git.create_branch(&branch, &start.commit)?;
                info!(%branch, at = %start.commit, "created branch");
                Ok(TaskReport::changed(
                    format!("branch {} created", branch),
                    payload,
                ))
            }
        }
    }
}
