//! tasks
//!
//! The caller-facing operations. Each task is a parameter struct that
//! implements [`Task`] and reports a [`TaskReport`].
//!
//! # Idempotence
//!
//! A task whose desired state already holds returns a report with
//! `changed: false` and a message saying why. "Nothing to do" is never an
//! error, so every task can be re-run safely, including after a failure.
//!
//! # Example
//!
//! ```ignore
//! use idemgit::tasks::{add::AddTask, Task};
//!
//! let report = AddTask { path: ".".into(), files: vec!["README.md".into()] }.run()?;
//! println!("{}", report.message);
//! ```

pub mod add;
pub mod branch;
pub mod checkout;
pub mod clone;
pub mod commit;
pub mod init;
pub mod push;
pub mod restore;
pub mod tag;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::config::{Config, ConfigError};
use crate::engine::EngineError;
use crate::git::{Git, GitError};

/// Outcome of a task.
///
/// Serializes flat: `changed`, `message`, then the payload's own keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport<P> {
    pub changed: bool,
    pub message: String,
    #[serde(flatten)]
    pub payload: P,
}

impl<P> TaskReport<P> {
    pub fn changed(message: impl Into<String>, payload: P) -> Self {
        Self {
            changed: true,
            message: message.into(),
            payload,
        }
    }

    pub fn unchanged(message: impl Into<String>, payload: P) -> Self {
        Self {
            changed: false,
            message: message.into(),
            payload,
        }
    }
}

/// Whether a task creates or deletes its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Add,
    Delete,
}

/// A caller-facing operation.
pub trait Task {
    /// Subcommand name, used in logs and failure reports.
    const NAME: &'static str;

    type Payload: Serialize;

    fn run(&self) -> Result<TaskReport<Self::Payload>, TaskError>;
}

/// Errors from tasks.
#[derive(Debug, Error)]
pub enum TaskError {
    /// A repository, ref, remote or branch does not exist.
    #[error("{message}")]
    NotFound { message: String },

    /// The request is inconsistent or incomplete.
    #[error("{message}")]
    InvalidState { message: String },

    /// Network or authentication failure during clone or push.
    #[error("{message}: {cause}")]
    TransportFailure { message: String, cause: String },

    /// Requested paths have unresolved conflicts.
    #[error("unresolved conflicts in: {}", paths.join(", "))]
    ConflictState { paths: Vec<String> },

    /// A filesystem operation outside the store failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Git(#[from] GitError),
}

impl TaskError {
    pub fn not_found(message: impl Into<String>) -> Self {
        TaskError::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        TaskError::InvalidState {
            message: message.into(),
        }
    }

    /// Short category name for failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::NotFound { .. } => "NotFound",
            TaskError::InvalidState { .. } => "InvalidState",
            TaskError::TransportFailure { .. } => "TransportFailure",
            TaskError::ConflictState { .. } => "ConflictState",
            TaskError::Io { .. } => "Io",
            TaskError::Config(_) => "Config",
            TaskError::Git(_) => "Git",
        }
    }
}

impl From<EngineError> for TaskError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Conflict { paths } => TaskError::ConflictState { paths },
            EngineError::NotFound { what } => TaskError::NotFound {
                message: format!("{} not found", what),
            },
            EngineError::Io { path, source } => TaskError::Io { path, source },
            EngineError::Git(e) => TaskError::Git(e),
        }
    }
}

/// Normalize a task's repository path.
pub(crate) fn normalize_repo_path(path: &Path) -> Result<PathBuf, TaskError> {
    crate::core::paths::normalize(path).map_err(|source| TaskError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Open the repository at `path` and load its configuration.
pub(crate) fn open_repo(path: &Path) -> Result<(Git, Config), TaskError> {
    let repo = normalize_repo_path(path)?;
    let git = Git::open(&repo).map_err(|e| match e {
        GitError::NotARepo { path } => {
            TaskError::not_found(format!("no repository at {}", path.display()))
        }
        other => TaskError::Git(other),
    })?;
    let config = load_config(Some(git.git_dir()))?;
    Ok((git, config))
}

/// Load configuration, logging any warnings.
pub(crate) fn load_config(git_dir: Option<&Path>) -> Result<Config, TaskError> {
    let loaded = Config::load(git_dir)?;
    for warning in &loaded.warnings {
        warn!(path = %warning.path.display(), "{}", warning.message);
    }
    Ok(loaded.config)
}

/// Join paths for report messages.
pub(crate) fn join_paths<S: AsRef<str>>(paths: &[S]) -> String {
    paths.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",")
}
