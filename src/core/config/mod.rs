//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! idemgit has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. Task arguments (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$IDEMGIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/idemgit/config.toml`
//! 3. `~/.idemgit/config.toml`
//!
//! # Repo Config Location
//!
//! `<git_dir>/idemgit/config.toml`, which also works for bare repositories.
//!
//! # Example
//!
//! ```no_run
//! use idemgit::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo/.git"))).unwrap();
//! let config = result.config;
//!
//! println!("Default branch: {}", config.default_branch());
//! println!("Remote: {}", config.remote());
//! ```

pub mod schema;

pub use schema::{CommitDefaults, ConfigLayer, SignatureConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::paths::RepoPaths;
use crate::core::types::{BranchName, Identity};

/// Branch an unborn repository commits to when nothing is configured.
pub const DEFAULT_BRANCH: &str = "master";

/// Remote used when nothing is configured.
pub const DEFAULT_REMOTE: &str = "origin";

/// Commit message used when none is given.
pub const DEFAULT_COMMIT_MESSAGE: &str = "committed by idemgit";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence: repo over global over defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: ConfigLayer,
    /// Repository configuration (if in a repo that has one)
    pub repo: Option<ConfigLayer>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `git_dir` is provided, also loads that repository's config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(git_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_from(&Self::global_candidates(), git_dir)
    }

    /// Load configuration, searching `global_candidates` in order for the
    /// global file.
    pub fn load_from(
        global_candidates: &[GlobalCandidate],
        git_dir: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = Self::load_global(global_candidates, &mut warnings)?;

        let (repo, repo_path) = match git_dir {
            Some(dir) => {
                let path = RepoPaths::new(dir.to_path_buf()).repo_config_path();
                if path.exists() {
                    (Some(Self::read_layer(&path)?), Some(path))
                } else {
                    (None, None)
                }
            }
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        debug!(
            global = ?global_path,
            repo = ?repo_path,
            "loaded configuration"
        );

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path,
                repo_path,
            },
            warnings,
        })
    }

    /// Standard global config locations, in search order.
    pub fn global_candidates() -> Vec<GlobalCandidate> {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var("IDEMGIT_CONFIG") {
            candidates.push(GlobalCandidate::explicit(PathBuf::from(path)));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            candidates.push(GlobalCandidate::implicit(
                PathBuf::from(xdg_home).join("idemgit/config.toml"),
            ));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(GlobalCandidate::implicit(home.join(".idemgit/config.toml")));
        }
        candidates
    }

    fn load_global(
        candidates: &[GlobalCandidate],
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(ConfigLayer, Option<PathBuf>), ConfigError> {
        for candidate in candidates {
            if candidate.path.exists() {
                let layer = Self::read_layer(&candidate.path)?;
                return Ok((layer, Some(candidate.path.clone())));
            }
            if candidate.explicit {
                warnings.push(ConfigWarning {
                    message: "IDEMGIT_CONFIG points to a missing file, ignoring it".to_string(),
                    path: candidate.path.clone(),
                });
            }
        }
        Ok((ConfigLayer::default(), None))
    }

    fn read_layer(path: &Path) -> Result<ConfigLayer, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Look up a value, repo layer first.
    fn layered<'a, T: ?Sized>(
        &'a self,
        get: impl Fn(&'a ConfigLayer) -> Option<&'a T>,
    ) -> Option<&'a T> {
        self.repo.as_ref().and_then(&get).or_else(|| get(&self.global))
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the default branch name.
    ///
    /// Defaults to `master` if not configured.
    pub fn default_branch(&self) -> BranchName {
        self.layered(|l| l.default_branch.as_deref())
            .and_then(|b| BranchName::new(b).ok())
            .unwrap_or_else(BranchName::fallback)
    }

    /// Get the remote name.
    ///
    /// Defaults to `origin` if not configured.
    pub fn remote(&self) -> &str {
        self.layered(|l| l.remote.as_deref()).unwrap_or(DEFAULT_REMOTE)
    }

    /// Get the author/tagger identity, field by field.
    pub fn identity(&self) -> Identity {
        let name = self
            .layered(|l| l.signature.as_ref().and_then(|s| s.name.as_deref()))
            .unwrap_or(Identity::DEFAULT_NAME);
        let email = self
            .layered(|l| l.signature.as_ref().and_then(|s| s.email.as_deref()))
            .unwrap_or(Identity::DEFAULT_EMAIL);
        Identity::new(name, email)
    }

    /// Get the default commit message.
    pub fn commit_message(&self) -> &str {
        self.layered(|l| l.commit.as_ref().and_then(|c| c.message.as_deref()))
            .unwrap_or(DEFAULT_COMMIT_MESSAGE)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

/// A possible global config location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalCandidate {
    pub path: PathBuf,
    /// Named explicitly by the user; a missing file is worth a warning
    pub explicit: bool,
}

impl GlobalCandidate {
    pub fn explicit(path: PathBuf) -> Self {
        Self {
            path,
            explicit: true,
        }
    }

    pub fn implicit(path: PathBuf) -> Self {
        Self {
            path,
            explicit: false,
        }
    }
}
