//! core::types
//!
//! Strong types for the values every task passes around.
//!
//! # Types
//!
//! - [`BranchName`] - Validated short branch name (`main`, `feature/x`)
//! - [`RefName`] - Validated full reference name (`refs/heads/main`, `HEAD`)
//! - [`Oid`] - Git object identifier (SHA)
//! - [`Identity`] - Author/tagger name and email
//! - [`Credentials`] - How to authenticate against a remote
//!
//! # Validation
//!
//! Names are checked against Git's refname rules at construction time, so a
//! `RefName` handed to the git doorway is always well formed.
//!
//! ```
//! use idemgit::core::types::{BranchName, Oid, RefName};
//!
//! let branch = BranchName::new("feature/login").unwrap();
//! assert_eq!(RefName::for_branch(&branch).as_str(), "refs/heads/feature/login");
//!
//! assert!(BranchName::new("bad..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),
}

/// Characters Git never allows inside a reference name.
const FORBIDDEN_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];

/// Check a name against `git check-ref-format` rules.
///
/// Returns a human readable reason on failure; the caller wraps it in the
/// right [`TypeError`] variant.
fn check_ref_format(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".into());
    }
    if name == "@" {
        return Err("name cannot be '@'".into());
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err("name cannot start or end with '/'".into());
    }
    if name.ends_with('.') {
        return Err("name cannot end with '.'".into());
    }
    for seq in ["..", "@{", "//"] {
        if name.contains(seq) {
            return Err(format!("name cannot contain '{seq}'"));
        }
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(format!("name cannot contain '{c}'"));
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Err("name cannot contain control characters".into());
    }
    for component in name.split('/') {
        if component.starts_with('.') {
            return Err("path component cannot start with '.'".into());
        }
        if component.ends_with(".lock") {
            return Err("path component cannot end with '.lock'".into());
        }
    }
    Ok(())
}

/// A validated short branch name.
///
/// ```
/// use idemgit::core::types::BranchName;
///
/// assert!(BranchName::new("release/1.0").is_ok());
/// assert!(BranchName::new("-flag").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot start with '-'".into(),
            ));
        }
        check_ref_format(&name).map_err(TypeError::InvalidBranchName)?;
        Ok(Self(name))
    }

    /// The branch used when no configuration names one.
    pub fn fallback() -> Self {
        Self(crate::core::config::DEFAULT_BRANCH.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256), normalized to lowercase.
///
/// ```
/// use idemgit::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a full hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    /// Abbreviated form; the full OID when `len` exceeds its length.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated full reference name.
///
/// `HEAD` is accepted so that a detached HEAD can be named like any other
/// commit target.
///
/// ```
/// use idemgit::core::types::RefName;
///
/// let tag = RefName::for_tag("v1.0").unwrap();
/// assert_eq!(tag.as_str(), "refs/tags/v1.0");
/// assert!(tag.is_tag_ref());
/// assert_eq!(tag.shorthand(), "v1.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    pub const HEAD: &'static str = "HEAD";
    pub const BRANCH_PREFIX: &'static str = "refs/heads/";
    pub const TAG_PREFIX: &'static str = "refs/tags/";
    pub const REMOTE_PREFIX: &'static str = "refs/remotes/";

    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_ref_format(&name).map_err(TypeError::InvalidRefName)?;
        Ok(Self(name))
    }

    /// `refs/heads/<branch>`.
    pub fn for_branch(branch: &BranchName) -> Self {
        // Branch names are validated, and the prefix keeps them valid.
        Self(format!("{}{}", Self::BRANCH_PREFIX, branch.as_str()))
    }

    /// `refs/tags/<tag>`.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if `tag` is not a valid name.
    pub fn for_tag(tag: &str) -> Result<Self, TypeError> {
        Self::new(format!("{}{}", Self::TAG_PREFIX, tag))
    }

    pub fn head() -> Self {
        Self(Self::HEAD.to_string())
    }

    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    pub fn is_branch_ref(&self) -> bool {
        self.0.starts_with(Self::BRANCH_PREFIX)
    }

    pub fn is_tag_ref(&self) -> bool {
        self.0.starts_with(Self::TAG_PREFIX)
    }

    pub fn is_head(&self) -> bool {
        self.0 == Self::HEAD
    }

    /// The name with its namespace prefix removed (`refs/heads/main` -> `main`).
    pub fn shorthand(&self) -> &str {
        [Self::BRANCH_PREFIX, Self::TAG_PREFIX, Self::REMOTE_PREFIX]
            .iter()
            .find_map(|p| self.0.strip_prefix(p))
            .unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name and email recorded as author/committer of commits and as tagger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub const DEFAULT_NAME: &'static str = "idemgit";
    pub const DEFAULT_EMAIL: &'static str = "idemgit@localhost";

    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME, Self::DEFAULT_EMAIL)
    }
}

/// How to authenticate against a remote during clone and push.
///
/// Built from loose task parameters with [`Credentials::from_parts`], which
/// applies the priority keypair > username > none.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    /// Let the transport proceed without supplying credentials.
    #[default]
    NoAuth,
    /// Supply only a username (e.g. for ssh transports that ask for one).
    UsernameOnly(String),
    /// An ssh keypair from disk, optionally protected by a passphrase.
    Keypair {
        username: String,
        public_key: Option<PathBuf>,
        private_key: PathBuf,
        passphrase: Option<String>,
    },
}

impl Credentials {
    /// Username used for keypairs when none is given.
    pub const DEFAULT_SSH_USER: &'static str = "git";

    /// Pick a credential kind from optional parts.
    ///
    /// A private key selects [`Credentials::Keypair`]; otherwise a username
    /// selects [`Credentials::UsernameOnly`]; otherwise [`Credentials::NoAuth`].
    ///
    /// ```
    /// use idemgit::core::types::Credentials;
    ///
    /// let creds = Credentials::from_parts(Some("deploy"), None, None, None);
    /// assert_eq!(creds, Credentials::UsernameOnly("deploy".into()));
    /// assert_eq!(Credentials::from_parts(None, None, None, None), Credentials::NoAuth);
    /// ```
    pub fn from_parts(
        username: Option<&str>,
        public_key: Option<PathBuf>,
        private_key: Option<PathBuf>,
        passphrase: Option<String>,
    ) -> Self {
        match (private_key, username) {
            (Some(private_key), user) => Credentials::Keypair {
                username: user.unwrap_or(Self::DEFAULT_SSH_USER).to_string(),
                public_key,
                private_key,
                passphrase,
            },
            (None, Some(user)) => Credentials::UsernameOnly(user.to_string()),
            (None, None) => Credentials::NoAuth,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::NoAuth => "none",
            Credentials::UsernameOnly(_) => "username",
            Credentials::Keypair { .. } => "keypair",
        }
    }
}

// Keeps the passphrase out of debug logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::NoAuth => f.write_str("NoAuth"),
            Credentials::UsernameOnly(user) => f.debug_tuple("UsernameOnly").field(user).finish(),
            Credentials::Keypair {
                username,
                public_key,
                private_key,
                passphrase,
            } => f
                .debug_struct("Keypair")
                .field("username", username)
                .field("public_key", public_key)
                .field("private_key", private_key)
                .field("passphrase", &passphrase.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}
