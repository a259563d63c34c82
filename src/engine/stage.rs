//! engine::stage
//!
//! Staging coordinator.
//!
//! Stages exactly those requested paths that differ between the index and
//! the working directory. Everything else (outside the worktree, ignored,
//! unreadable, already staged, nonexistent) is reported back as ignored, so
//! staging the same set twice is a no-op the second time.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use super::EngineError;
use crate::core::paths;
use crate::core::status::{self, FileStatus};
use crate::git::Git;

/// What a staging batch did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    /// Index paths that were updated
    pub staged: Vec<String>,
    /// Requested paths that were left alone
    pub ignored: Vec<String>,
}

impl StageOutcome {
    pub fn changed(&self) -> bool {
        !self.staged.is_empty()
    }
}

/// Stage the requested paths.
///
/// # Errors
///
/// - [`EngineError::Conflict`] if any requested path is conflicted; the
///   index is not touched
/// - [`EngineError::Git`] if updating or persisting the index fails; nothing
///   from the batch is persisted
pub fn stage(git: &Git, requested: &[PathBuf]) -> Result<StageOutcome, EngineError> {
    let unstaged = status::index_vs_workdir(git)?;

    let mut outcome = StageOutcome::default();
    let mut plan: Vec<(String, FileStatus)> = Vec::new();
    let mut seen = BTreeSet::new();
    let mut conflicts = Vec::new();

    for path in requested {
        let Some(relative) = paths::relativize(git, path).relative else {
            outcome.ignored.push(path.display().to_string());
            continue;
        };
        if !seen.insert(relative.clone()) {
            continue;
        }

        match unstaged.get(&relative) {
            Some(FileStatus::Conflicted) => conflicts.push(relative),
            Some(status) if status.is_stageable() => plan.push((relative, status)),
            other => {
                debug!(path = %relative, status = ?other, "nothing to stage");
                outcome.ignored.push(relative);
            }
        }
    }

    if !conflicts.is_empty() {
        return Err(EngineError::Conflict { paths: conflicts });
    }
    if plan.is_empty() {
        return Ok(outcome);
    }

    let mut index = git.load_index()?;
    for (path, status) in plan {
        match status {
            FileStatus::Deleted => index.unstage_path(&path)?,
            _ => index.stage_path(&path)?,
        }
        outcome.staged.push(path);
    }
    git.persist_index(&mut index)?;

    debug!(staged = ?outcome.staged, "staged batch");
    Ok(outcome)
}
