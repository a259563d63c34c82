//! engine::commit
//!
//! Commit parent derivation.
//!
//! A commit is written to a *target ref* on top of whatever that ref points
//! at. The parent list is empty exactly when nothing is reachable from the
//! target; otherwise it holds that single commit. Merges are never created.

use serde::Serialize;
use tracing::debug;

use super::EngineError;
use crate::core::config::Config;
use crate::core::resolve;
use crate::core::status;
use crate::core::types::{Identity, Oid, RefName};
use crate::git::Git;

/// Where a new commit goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitTarget {
    pub refname: RefName,
    pub parents: Vec<Oid>,
}

/// Result of a commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Created { id: Oid, target: CommitTarget },
    /// The index holds nothing new relative to the target's parent.
    NothingStaged { target: CommitTarget },
}

impl CommitOutcome {
    pub fn target(&self) -> &CommitTarget {
        match self {
            CommitOutcome::Created { target, .. } | CommitOutcome::NothingStaged { target } => {
                target
            }
        }
    }
}

/// Work out the target ref and parents for a commit on `requested`.
///
/// # Errors
///
/// [`EngineError::NotFound`] when `requested` names no existing ref and the
/// repository already has local branches.
pub fn derive_target(
    git: &Git,
    config: &Config,
    requested: Option<&str>,
) -> Result<CommitTarget, EngineError> {
    let requested = requested.map(str::trim).filter(|n| !n.is_empty());

    if resolve::is_unborn(git)? {
        let refname = resolve::canonicalize(git, config, requested)?;
        // HEAD is unborn, but the requested ref may still exist elsewhere
        let parents = git.try_resolve_ref(refname.as_str())?.into_iter().collect();
        return Ok(CommitTarget { refname, parents });
    }

    let Some(name) = requested else {
        let refname = resolve::canonicalize(git, config, None)?;
        return Ok(CommitTarget {
            refname,
            parents: vec![git.head_oid()?],
        });
    };

    if let Some(refname) = resolve::dwim(git, name)? {
        if let Some(commit) = git.try_resolve_ref(refname.as_str())? {
            return Ok(CommitTarget {
                refname,
                parents: vec![commit],
            });
        }
    }

    if git.list_branches()?.is_empty() {
        let refname = resolve::canonicalize(git, config, Some(name))?;
        debug!(%refname, "no local branches, first commit on a new branch");
        return Ok(CommitTarget {
            refname,
            parents: Vec::new(),
        });
    }

    Err(EngineError::NotFound {
        what: format!("branch {}", name),
    })
}

/// Commit the index to `target`, unless nothing is staged against its parent.
///
/// # Errors
///
/// [`EngineError::Conflict`] when the index still has conflict entries.
pub fn create_commit(
    git: &Git,
    target: CommitTarget,
    message: &str,
    author: &Identity,
) -> Result<CommitOutcome, EngineError> {
    let staged = status::tree_vs_index(git, target.parents.first())?;
    if staged.is_empty() {
        return Ok(CommitOutcome::NothingStaged { target });
    }

    let conflicts = staged.conflicted();
    if !conflicts.is_empty() {
        return Err(EngineError::Conflict {
            paths: conflicts.into_iter().map(String::from).collect(),
        });
    }

    let mut index = git.load_index()?;
    let tree = index.write_tree()?;
    let id = git.create_commit(&target.refname, author, message, &tree, &target.parents)?;

    debug!(%id, refname = %target.refname, parents = target.parents.len(), "created commit");
    Ok(CommitOutcome::Created { id, target })
}
