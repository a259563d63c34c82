//! core::resolve
//!
//! Name resolution: turning user-supplied ref-ish strings into canonical
//! references and commits.
//!
//! Two questions are kept apart:
//!
//! - [`canonicalize`] answers "which ref should this name *mean*?" and never
//!   fails for a missing ref. Creation targets (a new branch, the first commit
//!   of an unborn repository) need a name even when nothing exists yet.
//! - [`resolve`] answers "which commit does this name point at *now*?" and
//!   returns `None` when nothing matches. Callers decide whether that is fatal.
//!
//! Short names are looked up branch first, then tag, then remote-tracking ref.

use serde::Serialize;
use tracing::debug;

use crate::core::config::Config;
use crate::core::types::{Oid, RefName};
use crate::git::{Git, GitError};

/// A ref-ish that resolved to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved {
    pub commit: Oid,
    /// The reference the name went through, if it named one
    pub reference: Option<RefName>,
}

/// True when HEAD points at a branch with no commits.
pub fn is_unborn(git: &Git) -> Result<bool, GitError> {
    git.head_is_unborn()
}

/// The branch reference a repository commits to by default.
///
/// This is the branch HEAD points at when HEAD is symbolic to a branch, which
/// covers unborn repositories. Otherwise the configured default branch.
pub fn default_branch(git: &Git, config: &Config) -> Result<RefName, GitError> {
    if let Some(target) = git.head_symbolic_target()? {
        if target.is_branch_ref() {
            return Ok(target);
        }
    }
    Ok(RefName::for_branch(&config.default_branch()))
}

/// Find the existing reference a short name refers to.
///
/// Full names (`refs/...`) and `HEAD` are only checked as given.
pub fn dwim(git: &Git, name: &str) -> Result<Option<RefName>, GitError> {
    let candidates: Vec<String> = if name == RefName::HEAD || name.starts_with("refs/") {
        vec![name.to_string()]
    } else {
        vec![
            format!("{}{}", RefName::BRANCH_PREFIX, name),
            format!("{}{}", RefName::TAG_PREFIX, name),
            format!("{}{}", RefName::REMOTE_PREFIX, name),
            format!("{}{}/HEAD", RefName::REMOTE_PREFIX, name),
        ]
    };

    for candidate in candidates {
        if git.ref_exists(&candidate) {
            return Ok(Some(RefName::new(candidate)?));
        }
    }
    Ok(None)
}

/// The canonical reference `name` stands for.
///
/// - no name, unborn repository: [`default_branch`]
/// - no name, born HEAD: HEAD's symbolic target, or `HEAD` when detached
/// - a name: the existing ref it refers to, else `refs/heads/<name>`
///
/// # Errors
///
/// Only store failures and names that cannot form a valid ref.
pub fn canonicalize(git: &Git, config: &Config, name: Option<&str>) -> Result<RefName, GitError> {
    let name = name.map(str::trim).filter(|n| !n.is_empty());

    let Some(name) = name else {
        if is_unborn(git)? {
            return default_branch(git, config);
        }
        return Ok(git.head_symbolic_target()?.unwrap_or_else(RefName::head));
    };

    if let Some(found) = dwim(git, name)? {
        return Ok(found);
    }

    debug!(name, "no existing ref, synthesizing branch ref");
    if name.starts_with("refs/") {
        return Ok(RefName::new(name)?);
    }
    Ok(RefName::new(format!("{}{}", RefName::BRANCH_PREFIX, name))?)
}

/// Resolve a ref-ish to the commit it currently names.
///
/// Accepts branch, tag and remote names, `HEAD`, full ref names, full or
/// abbreviated hashes, and revision expressions such as `HEAD~1`.
pub fn resolve(git: &Git, refish: &str) -> Result<Option<Resolved>, GitError> {
    let refish = refish.trim();
    if refish.is_empty() {
        return Ok(None);
    }

    if let Some(reference) = dwim(git, refish)? {
        if let Some(commit) = git.try_resolve_ref(reference.as_str())? {
            return Ok(Some(Resolved {
                commit,
                reference: Some(reference),
            }));
        }
    }

    let parsed = git.revparse_commit(refish)?;
    if parsed.is_none() {
        debug!(refish, "ref-ish did not resolve");
    }
    Ok(parsed.map(|(commit, reference)| Resolved { commit, reference }))
}
