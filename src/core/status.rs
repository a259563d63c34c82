//! core::status
//!
//! Sparse three-way status: which paths differ between a commit tree and the
//! index, and between the index and the working directory.
//!
//! Only differing paths appear in a [`StatusMap`]; unchanged paths are never
//! enumerated. Every comparison involves exactly two sides.
//!
//! # Conflicts
//!
//! A path with conflict entries in the index is reported as
//! [`FileStatus::Conflicted`] in both maps, whatever else the diff says
//! about it.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::resolve;
use crate::core::types::Oid;
use crate::git::{Change, ChangeKind, Git, GitError};

/// How a path differs between two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    New,
    Modified,
    Deleted,
    Renamed,
    TypeChange,
    Ignored,
    Conflicted,
    /// Present in the workdir but could not be read
    Unreadable,
}

impl FileStatus {
    /// Classify a raw change; `None` means the path is unchanged.
    fn classify(kind: ChangeKind) -> Option<Self> {
        match kind {
            ChangeKind::Unmodified => None,
            ChangeKind::Added | ChangeKind::Untracked | ChangeKind::Copied => Some(FileStatus::New),
            ChangeKind::Modified => Some(FileStatus::Modified),
            ChangeKind::Deleted => Some(FileStatus::Deleted),
            ChangeKind::Renamed => Some(FileStatus::Renamed),
            ChangeKind::Typechange => Some(FileStatus::TypeChange),
            ChangeKind::Ignored => Some(FileStatus::Ignored),
            ChangeKind::Conflicted => Some(FileStatus::Conflicted),
            ChangeKind::Unreadable => Some(FileStatus::Unreadable),
        }
    }

    /// True for differences that staging can record in the index.
    pub fn is_stageable(self) -> bool {
        match self {
            FileStatus::New
            | FileStatus::Modified
            | FileStatus::Deleted
            | FileStatus::Renamed
            | FileStatus::TypeChange => true,
            FileStatus::Ignored | FileStatus::Conflicted | FileStatus::Unreadable => false,
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileStatus::New => "new",
            FileStatus::Modified => "modified",
            FileStatus::Deleted => "deleted",
            FileStatus::Renamed => "renamed",
            FileStatus::TypeChange => "type_change",
            FileStatus::Ignored => "ignored",
            FileStatus::Conflicted => "conflicted",
            FileStatus::Unreadable => "unreadable",
        };
        f.write_str(s)
    }
}

/// Path -> status, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusMap(BTreeMap<String, FileStatus>);

impl StatusMap {
    pub fn get(&self, path: &str) -> Option<FileStatus> {
        self.0.get(path).copied()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FileStatus)> {
        self.0.iter().map(|(p, s)| (p.as_str(), *s))
    }

    /// Paths in conflict.
    pub fn conflicted(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, s)| *s == FileStatus::Conflicted)
            .map(|(p, _)| p)
            .collect()
    }

    fn from_changes(changes: Vec<Change>, conflicted: Vec<String>) -> Self {
        let mut map = BTreeMap::new();
        for change in changes {
            let Some(status) = FileStatus::classify(change.kind) else {
                continue;
            };
            // Keep the source of a rename visible so it can be restored
            if status == FileStatus::Renamed {
                if let Some(old) = change.old_path {
                    map.entry(old).or_insert(FileStatus::Deleted);
                }
            }
            map.insert(change.path, status);
        }
        for path in conflicted {
            map.insert(path, FileStatus::Conflicted);
        }
        Self(map)
    }
}

impl FromIterator<(String, FileStatus)> for StatusMap {
    fn from_iter<I: IntoIterator<Item = (String, FileStatus)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn conflicted_paths(git: &Git) -> Result<Vec<String>, GitError> {
    if git.is_bare() {
        return Ok(Vec::new());
    }
    git.load_index()?.conflicted_paths()
}

/// Staged differences between `target`'s tree (default `HEAD`) and the index.
///
/// An unborn HEAD compares against the empty tree.
///
/// # Errors
///
/// [`GitError::RefNotFound`] when an explicit `target` does not resolve.
pub fn head_vs_index(git: &Git, target: Option<&str>) -> Result<StatusMap, GitError> {
    let commit = match target {
        Some(refish) => match resolve::resolve(git, refish)? {
            Some(resolved) => Some(resolved.commit),
            None => {
                return Err(GitError::RefNotFound {
                    refname: refish.to_string(),
                })
            }
        },
        None if git.head_is_unborn()? => None,
        None => Some(git.head_oid()?),
    };
    tree_vs_index(git, commit.as_ref())
}

/// Staged differences between `commit`'s tree (`None`: the empty tree) and
/// the index.
pub fn tree_vs_index(git: &Git, commit: Option<&Oid>) -> Result<StatusMap, GitError> {
    let changes = git.diff_tree_to_index(commit)?;
    Ok(StatusMap::from_changes(changes, conflicted_paths(git)?))
}

/// Unstaged differences between the index and the working directory.
///
/// Untracked files are listed individually; ignored directories are listed
/// once, without their contents. Bare repositories have no differences.
pub fn index_vs_workdir(git: &Git) -> Result<StatusMap, GitError> {
    if git.is_bare() {
        return Ok(StatusMap::default());
    }
    let changes = git.diff_index_to_workdir()?;
    Ok(StatusMap::from_changes(changes, conflicted_paths(git)?))
}
