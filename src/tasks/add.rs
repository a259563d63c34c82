//! tasks::add
//!
//! Stage files that differ from the index.

use std::path::PathBuf;

use serde::Serialize;

use super::{join_paths, open_repo, Task, TaskError, TaskReport};
use crate::core::status::{self, StatusMap};
use crate::engine;

#[derive(Debug, Clone)]
pub struct AddTask {
    pub path: PathBuf,
    /// Paths to stage; relative paths are taken from the worktree root
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddPayload {
    pub added_files: Vec<String>,
    /// Staged differences against HEAD after this run
    pub status: StatusMap,
}

impl Task for AddTask {
    const NAME: &'static str = "add";
    type Payload = AddPayload;

    fn run(&self) -> Result<TaskReport<AddPayload>, TaskError> {
        let (git, _config) = open_repo(&self.path)?;

        let outcome = engine::stage(&git, &self.files)?;
        let payload = AddPayload {
            status: status::head_vs_index(&git, None)?,
            added_files: outcome.staged,
        };

        if payload.added_files.is_empty() {
            return Ok(TaskReport::unchanged(
                "no new files added for commit",
                payload,
            ));
        }
        Ok(TaskReport::changed(
            format!("staged {} for commit", join_paths(&payload.added_files)),
            payload,
        ))
    }
}
