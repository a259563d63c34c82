//! tasks::checkout
//!
//! Switch to a branch, or bring selected files in line with it.
//!
//! Without files the whole tree is checked out and HEAD moves. With files
//! only those paths are written (index and workdir) and HEAD stays put;
//! files that already match the branch are not touched.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use super::{join_paths, open_repo, Task, TaskError, TaskReport};
use crate::core::paths;
use crate::core::resolve;
use crate::core::status::{self, FileStatus};
use crate::git::CheckoutStrategy;

#[derive(Debug, Clone)]
pub struct CheckoutTask {
    pub path: PathBuf,
    pub branch: String,
    pub files: Vec<PathBuf>,
    /// Overwrite local modifications
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutPayload {
    /// The reference that was checked out
    pub branch: String,
    pub files: Vec<String>,
}

impl Task for CheckoutTask {
    const NAME: &'static str = "checkout";
    type Payload = CheckoutPayload;

    fn run(&self) -> Result<TaskReport<CheckoutPayload>, TaskError> {
        let (git, _config) = open_repo(&self.path)?;

        let resolved = resolve::resolve(&git, &self.branch)?;
        let Some((commit, reference)) =
            resolved.and_then(|r| r.reference.map(|reference| (r.commit, reference)))
        else {
            return Err(TaskError::not_found(format!(
                "can't resolve branch {}",
                self.branch
            )));
        };

        let strategy = if self.force {
            CheckoutStrategy::Force
        } else {
            CheckoutStrategy::Safe
        };

        if self.files.is_empty() {
            let payload = CheckoutPayload {
                branch: reference.to_string(),
                files: Vec::new(),
            };
            let current = git.head_symbolic_target()?;
            if !git.head_is_unborn()? && current.as_ref() == Some(&reference) {
                return Ok(TaskReport::unchanged(
                    format!("{} already checked out", self.branch),
                    payload,
                ));
            }

            git.checkout_tree(&commit, None, strategy, true)?;
            if reference.is_branch_ref() {
                git.set_head(&reference)?;
            } else {
                git.set_head_detached(&commit)?;
            }
            info!(%reference, "checked out");
            return Ok(TaskReport::changed(
                format!("checked out {}", self.branch),
                payload,
            ));
        }

        let staged = status::tree_vs_index(&git, Some(&commit))?;
        let unstaged = status::index_vs_workdir(&git)?;
        let mut seen = BTreeSet::new();
        let mut files = Vec::new();
        for file in &self.files {
            let Some(relative) = paths::relativize(&git, file).relative else {
                continue;
            };
            // Untracked and ignored files are not the branch's to overwrite
            let differs = staged.contains(&relative)
                || matches!(
                    unstaged.get(&relative),
                    Some(FileStatus::Modified | FileStatus::Deleted | FileStatus::TypeChange)
                );
            if !differs {
                debug!(path = %relative, "already matches {}", reference);
                continue;
            }
            if seen.insert(relative.clone()) {
                files.push(relative);
            }
        }

        let payload = CheckoutPayload {
            branch: reference.to_string(),
            files,
        };
        if payload.files.is_empty() {
            return Ok(TaskReport::unchanged(
                format!("files already match {}", self.branch),
                payload,
            ));
        }

        git.checkout_tree(&commit, Some(&payload.files), strategy, true)?;
        Ok(TaskReport::changed(
            format!("checked out files: {}", join_paths(&payload.files)),
            payload,
        ))
    }
}
