//! engine::restore
//!
//! Restores index entries and working directory files from a source commit.
//!
//! The staged set (source tree vs index) and unstaged set (index vs workdir)
//! are computed once, up front. A requested path in neither set already
//! matches the source and is skipped.
//!
//! - **Index**: a path in the staged set has its entry reset to the source
//!   blob, or removed when the source has no such path. This happens in
//!   both modes.
//! - **Workdir** (only with [`RestoreMode::Workdir`]): the file is removed and
//!   rewritten from the source tree. A path the source does not have stays
//!   removed, untracked and ignored files included.
//!
//! Workdir files are written first; the index is then loaded, updated and
//! persisted once.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::EngineError;
use crate::core::paths;
use crate::core::resolve;
use crate::core::status::{self, FileStatus};
use crate::core::types::Oid;
use crate::git::{CheckoutStrategy, Git, GitError};

/// Which side a restore rewrites besides the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreMode {
    /// Reset index entries only.
    #[default]
    Staged,
    /// Also rewrite working directory files.
    Workdir,
}

/// What a restore did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreOutcome {
    /// Paths rewritten in the working directory
    pub workdir: Vec<String>,
    /// Paths whose index entry was reset
    pub index: Vec<String>,
}

impl RestoreOutcome {
    pub fn changed(&self) -> bool {
        !self.workdir.is_empty() || !self.index.is_empty()
    }

    /// Every touched path, once, in order.
    pub fn all_paths(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.workdir
            .iter()
            .chain(self.index.iter())
            .map(String::as_str)
            .filter(|p| seen.insert(*p))
            .collect()
    }
}

/// Restore `requested` paths from `source`.
///
/// # Errors
///
/// - [`EngineError::NotFound`] if `source` does not resolve to a commit
/// - [`EngineError::Conflict`] if any requested path is conflicted; nothing
///   is touched
pub fn restore(
    git: &Git,
    source: &str,
    requested: &[PathBuf],
    mode: RestoreMode,
) -> Result<RestoreOutcome, EngineError> {
    let source_commit = resolve::resolve(git, source)?
        .ok_or_else(|| EngineError::NotFound {
            what: format!("source {}", source),
        })?
        .commit;

    let staged = status::tree_vs_index(git, Some(&source_commit))?;
    let unstaged = status::index_vs_workdir(git)?;

    let mut seen = BTreeSet::new();
    let mut targets = Vec::new();
    let mut conflicts = Vec::new();
    for path in requested {
        let Some(relative) = paths::relativize(git, path).relative else {
            continue;
        };
        if !seen.insert(relative.clone()) {
            continue;
        }
        let in_staged = staged.get(&relative);
        let in_unstaged = unstaged.get(&relative);
        let conflicted = Some(FileStatus::Conflicted);
        if in_staged == conflicted || in_unstaged == conflicted {
            conflicts.push(relative);
            continue;
        }
        if in_staged.is_none() && in_unstaged.is_none() {
            debug!(path = %relative, "already matches source");
            continue;
        }
        targets.push((relative, in_staged.is_some()));
    }

    if !conflicts.is_empty() {
        return Err(EngineError::Conflict { paths: conflicts });
    }

    let mut outcome = RestoreOutcome::default();

    if mode == RestoreMode::Workdir {
        for (path, _) in &targets {
            restore_workdir_file(git, &source_commit, path)?;
            outcome.workdir.push(path.clone());
        }
    }

    let index_targets: Vec<&String> = targets
        .iter()
        .filter(|(_, in_staged)| *in_staged)
        .map(|(path, _)| path)
        .collect();
    if !index_targets.is_empty() {
        let mut index = git.load_index()?;
        for path in index_targets {
            match git.tree_entry(&source_commit, path)? {
                Some(entry) => index.reset_entry(path, &entry)?,
                None => index.unstage_path(path)?,
            }
            outcome.index.push(path.clone());
        }
        git.persist_index(&mut index)?;
    }

    Ok(outcome)
}

/// Replace the workdir copy of `path` with the source tree's version.
fn restore_workdir_file(git: &Git, source: &Oid, path: &str) -> Result<(), EngineError> {
    let work_dir = git.work_dir().ok_or(GitError::BareRepo)?;
    let absolute = work_dir.join(path);
    match std::fs::remove_file(&absolute) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(EngineError::Io {
                path: absolute,
                source: e,
            })
        }
    }
    let filter = [path.to_string()];
    git.checkout_tree(source, Some(&filter[..]), CheckoutStrategy::Force, false)?;
    Ok(())
}
