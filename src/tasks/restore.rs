//! tasks::restore
//!
//! Restore files from a source commit.

use std::path::PathBuf;

use serde::Serialize;

use super::{join_paths, open_repo, Task, TaskError, TaskReport};
use crate::core::types::RefName;
use crate::engine::{self, RestoreMode};

#[derive(Debug, Clone)]
pub struct RestoreTask {
    pub path: PathBuf,
    pub files: Vec<PathBuf>,
    /// Ref-ish to restore from; `HEAD` when absent
    pub source: Option<String>,
    pub mode: RestoreMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestorePayload {
    /// Paths rewritten in the working directory
    pub restored_files: Vec<String>,
    /// Paths whose index entry was reset to the source
    pub unstaged_files: Vec<String>,
}

impl Task for RestoreTask {
    const NAME: &'static str = "restore";
    type Payload = RestorePayload;

    fn run(&self) -> Result<TaskReport<RestorePayload>, TaskError> {
        let (git, _config) = open_repo(&self.path)?;
        let source = self.source.as_deref().unwrap_or(RefName::HEAD);

        let outcome = engine::restore(&git, source, &self.files, self.mode)?;
        let message = if outcome.changed() {
            format!("restored {}", join_paths(&outcome.all_paths()))
        } else {
            "no files restored".to_string()
        };
        let changed = outcome.changed();
        let payload = RestorePayload {
            restored_files: outcome.workdir,
            unstaged_files: outcome.index,
        };

        Ok(if changed {
            TaskReport::changed(message, payload)
        } else {
            TaskReport::unchanged(message, payload)
        })
    }
}
