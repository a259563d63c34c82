//! core::config::schema
//!
//! Configuration schema types.
//!
//! The global and repository files share one schema; a key set in the
//! repository file overrides the same key from the global file.
//!
//! # Validation
//!
//! Config values are validated after parsing: `default_branch` must be a
//! valid branch name, `remote` non-empty, and an email must contain `@`.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::BranchName;

/// One configuration file.
///
/// # Example
///
/// ```toml
/// default_branch = "main"
/// remote = "origin"
///
/// [signature]
/// name = "Release Bot"
/// email = "release@example.com"
///
/// [commit]
/// message = "automated commit"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    /// Branch an unborn repository commits to
    pub default_branch: Option<String>,

    /// Remote used by push when none is given
    pub remote: Option<String>,

    /// Author/tagger identity
    pub signature: Option<SignatureConfig>,

    /// Commit defaults
    pub commit: Option<CommitDefaults>,
}

impl ConfigLayer {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(branch) = &self.default_branch {
            BranchName::new(branch).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid default branch name: {}", e))
            })?;
        }

        if let Some(remote) = &self.remote {
            if remote.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "remote cannot be empty".to_string(),
                ));
            }
        }

        if let Some(signature) = &self.signature {
            signature.validate()?;
        }

        Ok(())
    }
}

/// `[signature]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SignatureConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl SignatureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "signature name cannot be empty".to_string(),
                ));
            }
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid signature email '{}'",
                    email
                )));
            }
        }
        Ok(())
    }
}

/// `[commit]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CommitDefaults {
    /// Message used when a commit task is given none
    pub message: Option<String>,
}
