//! engine
//!
//! Decisions shared by the tasks: what to stage, where a commit goes, and
//! what to restore.
//!
//! # Architecture
//!
//! Each engine function follows the same shape:
//!
//! ```text
//! Resolve inputs -> Classify (status) -> Decide -> Mutate index once -> Persist
//! ```
//!
//! Nothing is written until every requested path has been classified, so a
//! refused batch (conflicts, unresolvable source) leaves the repository
//! untouched.
//!
//! # Invariants
//!
//! - Only paths with a classified difference are touched
//! - The index is persisted at most once per call
//! - Re-running a call with the same inputs is a no-op

pub mod commit;
pub mod restore;
pub mod stage;

pub use commit::{create_commit, derive_target, CommitOutcome, CommitTarget};
pub use restore::{restore, RestoreMode, RestoreOutcome};
pub use stage::{stage, StageOutcome};

use std::path::PathBuf;

use crate::git::GitError;

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Requested paths have unresolved conflicts.
    #[error("unresolved conflicts in: {}", paths.join(", "))]
    Conflict { paths: Vec<String> },

    /// A named ref or commit does not exist.
    #[error("{what} not found")]
    NotFound { what: String },

    /// Writing the working directory failed.
    #[error("failed to update '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Git operation failed.
    #[error(transparent)]
    Git(#[from] GitError),
}
