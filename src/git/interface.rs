//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to the object store, the index
//! and the remotes. Every task reaches libgit2 through the [`Git`] struct,
//! which exposes a deliberately narrow set of operations and normalizes
//! failures into [`GitError`] categories.
//!
//! # Index handling
//!
//! The index is never mutated behind a caller's back. Callers take an
//! explicit [`IndexSnapshot`] with [`Git::load_index`], mutate it, and write
//! it back once with [`Git::persist_index`]. libgit2 persists through a lock
//! file and rename, so a failed persist never leaves a half-written index.
//!
//! # Example
//!
//! ```ignore
//! use idemgit::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let mut index = git.load_index()?;
//! index.stage_path("README.md")?;
//! git.persist_index(&mut index)?;
//! ```

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;
use tracing::debug;

use crate::core::types::{BranchName, Credentials, Identity, Oid, RefName, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// No repository at (or above) the given path.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// The operation needs a working directory but the repository is bare.
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Requested remote does not exist.
    #[error("remote not found: {name}")]
    RemoteNotFound {
        /// The remote name
        name: String,
    },

    /// A branch, tag or repository of that name already exists.
    #[error("already exists: {name}")]
    AlreadyExists {
        /// The conflicting name
        name: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Network or authentication failure talking to a remote.
    #[error("transport error: {message}")]
    Transport {
        /// The underlying cause
        message: String,
    },

    /// Permission, lock or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::UnbornBranch => {
                if context.starts_with("refs/") || context == "HEAD" || context.contains("ref") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::Exists => GitError::AlreadyExists {
                name: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidRefName {
                message: format!("{}: {}", context, err.message()),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            git2::ErrorCode::Auth | git2::ErrorCode::Certificate => GitError::Transport {
                message: format!("{}: {}", context, err.message()),
            },
            _ if matches!(
                err.class(),
                git2::ErrorClass::Net
                    | git2::ErrorClass::Ssh
                    | git2::ErrorClass::Http
                    | git2::ErrorClass::Ssl
            ) =>
            {
                GitError::Transport {
                    message: format!("{}: {}", context, err.message()),
                }
            }
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    fn internal(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// How a change between two sides of a diff is reported by the store.
///
/// Mirrors libgit2's delta kinds one to one so that classification can be
/// done with an exhaustive match outside this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Unmodified,
    Added,
    Deleted,
    Modified,
    Renamed,
    Copied,
    Ignored,
    Untracked,
    Typechange,
    Unreadable,
    Conflicted,
}

impl From<git2::Delta> for ChangeKind {
    fn from(delta: git2::Delta) -> Self {
        match delta {
            git2::Delta::Unmodified => ChangeKind::Unmodified,
            git2::Delta::Added => ChangeKind::Added,
            git2::Delta::Deleted => ChangeKind::Deleted,
            git2::Delta::Modified => ChangeKind::Modified,
            git2::Delta::Renamed => ChangeKind::Renamed,
            git2::Delta::Copied => ChangeKind::Copied,
            git2::Delta::Ignored => ChangeKind::Ignored,
            git2::Delta::Untracked => ChangeKind::Untracked,
            git2::Delta::Typechange => ChangeKind::Typechange,
            git2::Delta::Unreadable => ChangeKind::Unreadable,
            git2::Delta::Conflicted => ChangeKind::Conflicted,
        }
    }
}

/// One path reported by a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Path on the new side (relative, `/`-separated)
    pub path: String,
    /// Path on the old side when it differs (renames and copies)
    pub old_path: Option<String>,
    pub kind: ChangeKind,
}

/// Information about a commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub oid: Oid,
    pub parents: Vec<Oid>,
    pub tree: Oid,
    pub author: Identity,
    pub time: DateTime<Utc>,
    /// First line of the message
    pub summary: String,
}

/// A blob recorded in a commit's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub id: Oid,
    /// Raw git file mode (e.g. `0o100644`)
    pub mode: u32,
    pub size: u64,
}

/// Checkout strategy. Both variants recreate missing files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStrategy {
    /// Refuse to overwrite local modifications.
    Safe,
    /// Overwrite local modifications.
    Force,
}

/// What a push negotiated with the remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushSummary {
    /// Remote refs whose value the push moves
    pub updated: Vec<String>,
}

impl PushSummary {
    pub fn changed(&self) -> bool {
        !self.updated.is_empty()
    }
}

/// Explicitly loaded copy of the repository index.
///
/// Mutations stay in memory until handed to [`Git::persist_index`]. The
/// generation counter increases with every mutation, so callers can tell
/// whether a snapshot differs from what was loaded or last persisted.
pub struct IndexSnapshot {
    index: git2::Index,
    generation: u64,
    persisted_generation: u64,
}

impl std::fmt::Debug for IndexSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexSnapshot")
            .field("entries", &self.index.len())
            .field("generation", &self.generation)
            .field("persisted_generation", &self.persisted_generation)
            .finish()
    }
}

impl IndexSnapshot {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when the snapshot holds mutations not yet persisted.
    pub fn is_dirty(&self) -> bool {
        self.generation != self.persisted_generation
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Stage the current workdir content of `path` (relative to the worktree).
    pub fn stage_path(&mut self, path: &str) -> Result<(), GitError> {
        self.index
            .add_path(Path::new(path))
            .map_err(|e| GitError::from_git2(e, path))?;
        self.generation += 1;
        Ok(())
    }

    /// Drop `path` from the index (stages a deletion).
    pub fn unstage_path(&mut self, path: &str) -> Result<(), GitError> {
        self.index
            .remove_path(Path::new(path))
            .map_err(|e| GitError::from_git2(e, path))?;
        self.generation += 1;
        Ok(())
    }

    /// Point the index entry for `path` at an existing blob.
    pub fn reset_entry(&mut self, path: &str, blob: &TreeEntry) -> Result<(), GitError> {
        let id = to_git2_oid(&blob.id)?;
        let entry = git2::IndexEntry {
            ctime: git2::IndexTime::new(0, 0),
            mtime: git2::IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: blob.mode,
            uid: 0,
            gid: 0,
            file_size: u32::try_from(blob.size).unwrap_or(u32::MAX),
            id,
            flags: 0,
            flags_extended: 0,
            path: path.as_bytes().to_vec(),
        };
        self.index
            .add(&entry)
            .map_err(|e| GitError::from_git2(e, path))?;
        self.generation += 1;
        Ok(())
    }

    /// The staged blob for `path`, if any (stage 0 only).
    pub fn entry(&self, path: &str) -> Option<(Oid, u32)> {
        let entry = self.index.get_path(Path::new(path), 0)?;
        Oid::new(entry.id.to_string()).ok().map(|oid| (oid, entry.mode))
    }

    /// Paths with unresolved conflict entries.
    pub fn conflicted_paths(&self) -> Result<Vec<String>, GitError> {
        let mut paths = Vec::new();
        for conflict in self.index.conflicts().map_err(GitError::internal)? {
            let conflict = conflict.map_err(GitError::internal)?;
            let side = conflict.our.or(conflict.their).or(conflict.ancestor);
            if let Some(entry) = side {
                paths.push(String::from_utf8_lossy(&entry.path).into_owned());
            }
        }
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    /// Write the snapshot's content as a tree object.
    pub fn write_tree(&mut self) -> Result<Oid, GitError> {
        let oid = self.index.write_tree().map_err(GitError::internal)?;
        Ok(Oid::new(oid.to_string())?)
    }
}

fn to_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}

fn from_git2_oid(oid: git2::Oid) -> Result<Oid, GitError> {
    Ok(Oid::new(oid.to_string())?)
}

/// Give up after this many credential callbacks in one transfer; libgit2
/// keeps asking for as long as the remote keeps rejecting.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Build remote callbacks that answer credential requests from `creds`.
fn credential_callbacks(creds: &Credentials) -> git2::RemoteCallbacks<'_> {
    let mut callbacks = git2::RemoteCallbacks::new();
    if *creds == Credentials::NoAuth {
        return callbacks;
    }

    let attempts = Cell::new(0usize);
    callbacks.credentials(move |url, username_from_url, allowed| {
        attempts.set(attempts.get() + 1);
        if attempts.get() > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str(&format!(
                "{} credentials rejected by {}",
                creds.kind(),
                url
            )));
        }
        debug!(url, kind = creds.kind(), ?allowed, "supplying credentials");

        match creds {
            Credentials::NoAuth => git2::Cred::default(),
            Credentials::UsernameOnly(user) => git2::Cred::username(user),
            Credentials::Keypair {
                username,
                public_key,
                private_key,
                passphrase,
            } => {
                let user = username_from_url.unwrap_or(username);
                if allowed.contains(git2::CredentialType::USERNAME) {
                    return git2::Cred::username(user);
                }
                git2::Cred::ssh_key(
                    user,
                    public_key.as_deref(),
                    private_key,
                    passphrase.as_deref(),
                )
            }
        }
    });
    callbacks
}

/// The Git interface.
///
/// This is the **single point of interaction** with the Git object and index
/// store. Handles are opened per invocation and never cached.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .field("bare", &self.repo.is_bare())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Creation
    // =========================================================================

    /// Open the repository containing `path`.
    ///
    /// Uses discovery, so `path` can be any directory within the worktree.
    /// Bare repositories are accepted; operations that need a worktree
    /// report [`GitError::BareRepo`] themselves.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    /// Open a repository rooted exactly at `path`, without searching parents.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if `path` is not itself a repository
    pub fn open_exact(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    /// Create a repository at `path`, creating missing directories.
    ///
    /// `initial_branch` names the branch the unborn HEAD points at.
    pub fn init(path: &Path, bare: bool, initial_branch: &BranchName) -> Result<Self, GitError> {
        let mut opts = git2::RepositoryInitOptions::new();
        opts.bare(bare)
            .mkpath(true)
            .initial_head(initial_branch.as_str());

        let repo = git2::Repository::init_opts(path, &opts).map_err(|e| GitError::AccessError {
            message: format!("{}: {}", path.display(), e.message()),
        })?;
        debug!(path = %path.display(), bare, "initialized repository");
        Ok(Self { repo })
    }

    /// Clone `url` into `path`.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if `branch` does not exist upstream
    /// - [`GitError::Transport`] for network and authentication failures
    pub fn clone(
        url: &str,
        path: &Path,
        bare: bool,
        branch: Option<&BranchName>,
        creds: &Credentials,
    ) -> Result<Self, GitError> {
        let mut fetch = git2::FetchOptions::new();
        fetch.remote_callbacks(credential_callbacks(creds));

        let mut builder = git2::build::RepoBuilder::new();
        builder.bare(bare).fetch_options(fetch);
        if let Some(branch) = branch {
            builder.branch(branch.as_str());
        }

        debug!(url, path = %path.display(), bare, creds = creds.kind(), "cloning");
        let repo = builder.clone(url, path).map_err(|e| match (e.code(), branch) {
            // Only a failed ref lookup means the branch is missing; an
            // unreachable upstream is NotFound too, with another class.
            (git2::ErrorCode::NotFound, Some(branch))
                if matches!(e.class(), git2::ErrorClass::Reference | git2::ErrorClass::Invalid) =>
            {
                GitError::RefNotFound {
                    refname: branch.to_string(),
                }
            }
            _ => GitError::Transport {
                message: e.message().to_string(),
            },
        })?;
        Ok(Self { repo })
    }

    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// The worktree root; `None` for bare repositories.
    pub fn work_dir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    pub fn is_bare(&self) -> bool {
        self.repo.is_bare()
    }

    // =========================================================================
    // HEAD
    // =========================================================================

    /// True when HEAD points at a branch that has no commits yet.
    pub fn head_is_unborn(&self) -> Result<bool, GitError> {
        match self.repo.head() {
            Ok(_) => Ok(false),
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                Ok(true)
            }
            Err(e) => Err(GitError::from_git2(e, "HEAD")),
        }
    }

    /// The ref HEAD points at when symbolic, born or not.
    ///
    /// Returns `None` for a detached HEAD.
    pub fn head_symbolic_target(&self) -> Result<Option<RefName>, GitError> {
        let head = self
            .repo
            .find_reference("HEAD")
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        match head.symbolic_target() {
            Some(target) => Ok(Some(RefName::new(target)?)),
            None => Ok(None),
        }
    }

    /// Get HEAD commit OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if HEAD is unborn
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        self.resolve_ref("HEAD")
    }

    /// Get the current branch name, if on a branch.
    ///
    /// Returns `None` if HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        };

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(Some(BranchName::new(name)?));
            }
        }
        Ok(None)
    }

    /// Point HEAD at `refname` (symbolic) without touching the worktree.
    pub fn set_head(&self, refname: &RefName) -> Result<(), GitError> {
        self.repo
            .set_head(refname.as_str())
            .map_err(|e| GitError::from_git2(e, refname.as_str()))
    }

    /// Detach HEAD at `commit` without touching the worktree.
    pub fn set_head_detached(&self, commit: &Oid) -> Result<(), GitError> {
        self.repo
            .set_head_detached(to_git2_oid(commit)?)
            .map_err(|e| GitError::from_git2(e, commit.as_str()))
    }

    // =========================================================================
    // Ref Resolution
    // =========================================================================

    /// Resolve a ref to the commit it ultimately points at.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the ref doesn't exist or is unborn
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        let reference = self
            .repo
            .find_reference(refname)
            .map_err(|e| GitError::from_git2(e, refname))?;

        let commit = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, refname))?;

        from_git2_oid(commit.id())
    }

    /// Resolve a ref, returning None if it doesn't exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.resolve_ref(refname) {
            Ok(oid) => Ok(Some(oid)),
            Err(GitError::RefNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if a ref exists (an unborn symbolic ref does not count).
    pub fn ref_exists(&self, refname: &str) -> bool {
        self.repo
            .find_reference(refname)
            .and_then(|r| r.resolve())
            .is_ok()
    }

    /// Parse any revision expression the store understands (short hashes,
    /// `HEAD~2`, `v1.0^{}`) down to a commit.
    ///
    /// Returns `None` when nothing matches or the object is not a commit.
    /// The second element is the reference the expression named, if any.
    pub fn revparse_commit(&self, spec: &str) -> Result<Option<(Oid, Option<RefName>)>, GitError> {
        let (object, reference) = match self.repo.revparse_ext(spec) {
            Ok(parsed) => parsed,
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::NotFound
                        | git2::ErrorCode::InvalidSpec
                        | git2::ErrorCode::Ambiguous
                        | git2::ErrorCode::UnbornBranch
                ) =>
            {
                debug!(spec, reason = e.message(), "revspec did not resolve");
                return Ok(None);
            }
            Err(e) => return Err(GitError::from_git2(e, spec)),
        };

        let commit = match object.peel_to_commit() {
            Ok(commit) => commit,
            Err(_) => return Ok(None),
        };
        let refname = match reference.as_ref().and_then(|r| r.name()) {
            Some(name) => Some(RefName::new(name)?),
            None => None,
        };
        Ok(Some((from_git2_oid(commit.id())?, refname)))
    }

    // =========================================================================
    // Branches and Tags
    // =========================================================================

    /// List all local branches.
    pub fn list_branches(&self) -> Result<Vec<BranchName>, GitError> {
        let branches = self
            .repo
            .branches(Some(git2::BranchType::Local))
            .map_err(GitError::internal)?;

        let mut names = Vec::new();
        for branch in branches {
            let (branch, _) = branch.map_err(GitError::internal)?;
            if let Some(name) = branch.name().ok().flatten() {
                // Skip names we could not have created ourselves
                if let Ok(branch_name) = BranchName::new(name) {
                    names.push(branch_name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Create a local branch at `target`. Fails if it already exists.
    pub fn create_branch(&self, name: &BranchName, target: &Oid) -> Result<(), GitError> {
        let commit = self
            .repo
            .find_commit(to_git2_oid(target)?)
            .map_err(|e| GitError::from_git2(e, target.as_str()))?;
        self.repo
            .branch(name.as_str(), &commit, false)
            .map_err(|e| GitError::from_git2(e, name.as_str()))?;
        Ok(())
    }

    /// Delete a local branch.
    pub fn delete_branch(&self, name: &BranchName) -> Result<(), GitError> {
        let refname = RefName::for_branch(name);
        let mut branch = self
            .repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .map_err(|e| GitError::from_git2(e, refname.as_str()))?;
        branch
            .delete()
            .map_err(|e| GitError::from_git2(e, refname.as_str()))
    }

    /// Create an annotated tag object pointing at `target`.
    pub fn create_annotated_tag(
        &self,
        name: &str,
        target: &Oid,
        tagger: &Identity,
        message: &str,
    ) -> Result<Oid, GitError> {
        let object = self
            .repo
            .find_object(to_git2_oid(target)?, None)
            .map_err(|e| GitError::from_git2(e, target.as_str()))?;
        let sig = git2::Signature::now(&tagger.name, &tagger.email).map_err(GitError::internal)?;
        let oid = self
            .repo
            .tag(name, &object, &sig, message, false)
            .map_err(|e| GitError::from_git2(e, name))?;
        from_git2_oid(oid)
    }

    /// Create a lightweight tag ref pointing at `target`.
    pub fn create_lightweight_tag(&self, name: &str, target: &Oid) -> Result<Oid, GitError> {
        let object = self
            .repo
            .find_object(to_git2_oid(target)?, None)
            .map_err(|e| GitError::from_git2(e, target.as_str()))?;
        let oid = self
            .repo
            .tag_lightweight(name, &object, false)
            .map_err(|e| GitError::from_git2(e, name))?;
        from_git2_oid(oid)
    }

    pub fn delete_tag(&self, name: &str) -> Result<(), GitError> {
        self.repo
            .tag_delete(name)
            .map_err(|e| GitError::from_git2(e, &format!("refs/tags/{name}")))
    }

    // =========================================================================
    // Commits and Trees
    // =========================================================================

    /// Create a commit and move `update_ref` to it.
    pub fn create_commit(
        &self,
        update_ref: &RefName,
        author: &Identity,
        message: &str,
        tree: &Oid,
        parents: &[Oid],
    ) -> Result<Oid, GitError> {
        let sig = git2::Signature::now(&author.name, &author.email).map_err(GitError::internal)?;
        let tree = self
            .repo
            .find_tree(to_git2_oid(tree)?)
            .map_err(|e| GitError::from_git2(e, tree.as_str()))?;
        let parents = parents
            .iter()
            .map(|p| {
                self.repo
                    .find_commit(to_git2_oid(p)?)
                    .map_err(|e| GitError::from_git2(e, p.as_str()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        let oid = self
            .repo
            .commit(
                Some(update_ref.as_str()),
                &sig,
                &sig,
                message,
                &tree,
                &parent_refs,
            )
            .map_err(|e| GitError::from_git2(e, update_ref.as_str()))?;
        from_git2_oid(oid)
    }

    /// Read a commit's metadata.
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self
            .repo
            .find_commit(to_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        let author = commit.author();
        let time = Utc
            .timestamp_opt(author.when().seconds(), 0)
            .single()
            .unwrap_or_default();

        Ok(CommitInfo {
            oid: oid.clone(),
            parents: commit
                .parent_ids()
                .map(from_git2_oid)
                .collect::<Result<_, _>>()?,
            tree: from_git2_oid(commit.tree_id())?,
            author: Identity::new(
                author.name().unwrap_or_default(),
                author.email().unwrap_or_default(),
            ),
            time,
            summary: commit.summary().unwrap_or_default().to_string(),
        })
    }

    /// Look up the blob recorded for `path` in `commit`'s tree.
    ///
    /// Returns `None` when the tree has no such path or it is not a blob.
    pub fn tree_entry(&self, commit: &Oid, path: &str) -> Result<Option<TreeEntry>, GitError> {
        let commit = self
            .repo
            .find_commit(to_git2_oid(commit)?)
            .map_err(|e| GitError::from_git2(e, commit.as_str()))?;
        let tree = commit.tree().map_err(GitError::internal)?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, path)),
        };
        if entry.kind() != Some(git2::ObjectType::Blob) {
            return Ok(None);
        }
        let blob = self.repo.find_blob(entry.id()).map_err(GitError::internal)?;
        Ok(Some(TreeEntry {
            id: from_git2_oid(entry.id())?,
            mode: u32::try_from(entry.filemode()).unwrap_or_default(),
            size: blob.size() as u64,
        }))
    }

    // =========================================================================
    // Index
    // =========================================================================

    /// Load a fresh snapshot of the index from disk.
    ///
    /// Any unpersisted mutations of earlier snapshots are discarded.
    pub fn load_index(&self) -> Result<IndexSnapshot, GitError> {
        let mut index = self.repo.index().map_err(GitError::internal)?;
        index.read(true).map_err(|e| GitError::AccessError {
            message: format!("failed to read index: {}", e.message()),
        })?;
        Ok(IndexSnapshot {
            index,
            generation: 0,
            persisted_generation: 0,
        })
    }

    /// Write a snapshot back to disk, all or nothing.
    pub fn persist_index(&self, snapshot: &mut IndexSnapshot) -> Result<(), GitError> {
        snapshot.index.write().map_err(|e| GitError::AccessError {
            message: format!("failed to write index: {}", e.message()),
        })?;
        snapshot.persisted_generation = snapshot.generation;
        debug!(generation = snapshot.generation, "persisted index");
        Ok(())
    }

    // =========================================================================
    // Diffs
    // =========================================================================

    /// Changes between `commit`'s tree (the empty tree when `None`) and the index.
    ///
    /// Renames are detected so both halves of a staged move are reported.
    pub fn diff_tree_to_index(&self, commit: Option<&Oid>) -> Result<Vec<Change>, GitError> {
        let tree = match commit {
            Some(oid) => Some(
                self.repo
                    .find_commit(to_git2_oid(oid)?)
                    .and_then(|c| c.tree())
                    .map_err(|e| GitError::from_git2(e, oid.as_str()))?,
            ),
            None => None,
        };
        let mut index = self.repo.index().map_err(GitError::internal)?;
        index.read(false).map_err(GitError::internal)?;

        let mut opts = git2::DiffOptions::new();
        opts.include_typechange(true);
        let mut diff = self
            .repo
            .diff_tree_to_index(tree.as_ref(), Some(&index), Some(&mut opts))
            .map_err(GitError::internal)?;

        let mut find = git2::DiffFindOptions::new();
        find.renames(true);
        diff.find_similar(Some(&mut find))
            .map_err(GitError::internal)?;

        collect_changes(&diff)
    }

    /// Changes between the index and the working directory, including
    /// untracked files and (non-recursed) ignored entries.
    pub fn diff_index_to_workdir(&self) -> Result<Vec<Change>, GitError> {
        if self.repo.is_bare() {
            return Err(GitError::BareRepo);
        }
        let mut index = self.repo.index().map_err(GitError::internal)?;
        index.read(false).map_err(GitError::internal)?;

        let mut opts = git2::DiffOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(true)
            .recurse_ignored_dirs(false)
            .include_typechange(true);
        let diff = self
            .repo
            .diff_index_to_workdir(Some(&index), Some(&mut opts))
            .map_err(GitError::internal)?;

        collect_changes(&diff)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Check out `commit`'s tree into the working directory.
    ///
    /// With `paths`, only those (literal, worktree-relative) paths are
    /// touched. `update_index` controls whether the index follows the
    /// checkout; HEAD is never moved here.
    pub fn checkout_tree(
        &self,
        commit: &Oid,
        paths: Option<&[String]>,
        strategy: CheckoutStrategy,
        update_index: bool,
    ) -> Result<(), GitError> {
        let object = self
            .repo
            .find_object(to_git2_oid(commit)?, None)
            .map_err(|e| GitError::from_git2(e, commit.as_str()))?;

        let mut builder = git2::build::CheckoutBuilder::new();
        builder.recreate_missing(true).update_index(update_index);
        match strategy {
            CheckoutStrategy::Safe => builder.safe(),
            CheckoutStrategy::Force => builder.force(),
        };
        if let Some(paths) = paths {
            builder.disable_pathspec_match(true);
            for path in paths {
                builder.path(path);
            }
        }

        self.repo
            .checkout_tree(&object, Some(&mut builder))
            .map_err(|e| match e.code() {
                git2::ErrorCode::Conflict => GitError::AccessError {
                    message: format!("checkout would overwrite local changes: {}", e.message()),
                },
                _ => GitError::from_git2(e, commit.as_str()),
            })
    }

    // =========================================================================
    // Remote Operations
    // =========================================================================

    /// Get the URL for a remote; `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) if e.code() == git2::ErrorCode::InvalidSpec => Ok(None),
            Err(e) => Err(GitError::internal(e)),
        }
    }

    /// Push `refspecs` to `remote`.
    ///
    /// # Errors
    ///
    /// - [`GitError::RemoteNotFound`] if the remote is not configured
    /// - [`GitError::Transport`] on network/auth failure or when the remote
    ///   rejects any ref update
    pub fn push(
        &self,
        remote: &str,
        refspecs: &[String],
        creds: &Credentials,
    ) -> Result<PushSummary, GitError> {
        let mut handle = self.repo.find_remote(remote).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec => GitError::RemoteNotFound {
                name: remote.to_string(),
            },
            _ => GitError::internal(e),
        })?;

        let summary = RefCell::new(PushSummary::default());
        let rejected: RefCell<Vec<String>> = RefCell::new(Vec::new());

        let mut callbacks = credential_callbacks(creds);
        callbacks.push_negotiation(|updates| {
            let mut summary = summary.borrow_mut();
            for update in updates {
                if update.src() != update.dst() {
                    if let Some(dst) = update.dst_refname() {
                        summary.updated.push(dst.to_string());
                    }
                }
            }
            Ok(())
        });
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                rejected.borrow_mut().push(format!("{refname} ({status})"));
            }
            Ok(())
        });

        let mut opts = git2::PushOptions::new();
        opts.remote_callbacks(callbacks);

        debug!(remote, ?refspecs, creds = creds.kind(), "pushing");
        handle
            .push(refspecs, Some(&mut opts))
            .map_err(|e| GitError::Transport {
                message: e.message().to_string(),
            })?;
        drop(opts);

        let rejected = rejected.into_inner();
        if !rejected.is_empty() {
            return Err(GitError::Transport {
                message: format!("remote rejected updates for: {}", rejected.join(", ")),
            });
        }
        Ok(summary.into_inner())
    }
}

fn collect_changes(diff: &git2::Diff<'_>) -> Result<Vec<Change>, GitError> {
    let mut changes = Vec::new();
    for delta in diff.deltas() {
        let new_path = delta.new_file().path();
        let old_path = delta.old_file().path();
        let path = match new_path.or(old_path) {
            Some(p) => path_to_index_string(p),
            None => continue,
        };
        let old_path = old_path
            .map(path_to_index_string)
            .filter(|old| *old != path);
        changes.push(Change {
            path,
            old_path,
            kind: delta.status().into(),
        });
    }
    Ok(changes)
}

/// Index paths always use `/`, whatever the platform separator.
fn path_to_index_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
