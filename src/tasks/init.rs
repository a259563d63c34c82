//! tasks::init
//!
//! Create a repository unless one already exists at the path.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use super::{load_config, normalize_repo_path, Task, TaskError, TaskReport};
use crate::git::Git;

#[derive(Debug, Clone)]
pub struct InitTask {
    pub path: PathBuf,
    pub bare: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitPayload {
    pub repo: PathBuf,
    pub bare: bool,
    pub git_dir: PathBuf,
}

impl Task for InitTask {
    const NAME: &'static str = "init";
    type Payload = InitPayload;

    fn run(&self) -> Result<TaskReport<InitPayload>, TaskError> {
        let repo = normalize_repo_path(&self.path)?;

        if let Ok(existing) = Git::open_exact(&repo) {
            let payload = InitPayload {
                bare: existing.is_bare(),
                git_dir: existing.git_dir().to_path_buf(),
                repo: repo.clone(),
            };
            return Ok(TaskReport::unchanged(
                format!("repository exists at {}", repo.display()),
                payload,
            ));
        }

        let config = load_config(None)?;
        let git = Git::init(&repo, self.bare, &config.default_branch())?;
        info!(repo = %repo.display(), bare = self.bare, "created repository");

        Ok(TaskReport::changed(
            format!("created repository at {}", repo.display()),
            InitPayload {
                bare: git.is_bare(),
                git_dir: git.git_dir().to_path_buf(),
                repo,
            },
        ))
    }
}
