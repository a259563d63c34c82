//! core::paths
//!
//! Path normalization and worktree containment.
//!
//! Every file set a task receives passes through here before it reaches the
//! index. User paths may be relative, absolute, use `~`, contain `..`, or
//! point outside the repository entirely; this module turns each of them into
//! either an index path (`/`-separated, relative to the worktree root) or an
//! explicit "outside" verdict. It never fails for an out-of-tree path.
//!
//! It also routes idemgit's own storage inside the git directory
//! ([`RepoPaths`]).
//!
//! # Example
//!
//! ```
//! use idemgit::core::paths::relativize_to;
//! use std::path::Path;
//!
//! let root = Path::new("/nonexistent-root/repo");
//! let inside = relativize_to(Some(root), Path::new("src/../README.md"));
//! assert_eq!(inside.relative.as_deref(), Some("README.md"));
//!
//! let outside = relativize_to(Some(root), Path::new("../elsewhere.txt"));
//! assert!(!outside.inside_worktree());
//! ```

use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::git::Git;

/// A user path checked against a worktree root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelativePath {
    /// The normalized absolute form of the input
    pub absolute: PathBuf,
    /// Index path relative to the worktree root; `None` when outside
    pub relative: Option<String>,
}

impl RelativePath {
    pub fn inside_worktree(&self) -> bool {
        self.relative.is_some()
    }
}

/// Normalize `path` against the process working directory.
///
/// Expands `~`, resolves `.` and `..`, and resolves symlinks in the longest
/// existing prefix of the parent directory. The final component is kept as
/// given: a symlink names itself, not its target.
pub fn normalize(path: &Path) -> std::io::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(normalize_from(&cwd, path))
}

/// Normalize `path`, resolving a relative path against `base`.
pub fn normalize_from(base: &Path, path: &Path) -> PathBuf {
    let cleaned = lexical_clean(&absolutize(base, path));
    match (cleaned.parent(), cleaned.file_name()) {
        (Some(parent), Some(name)) => resolve_existing_prefix(parent).join(name),
        _ => resolve_existing_prefix(&cleaned),
    }
}

/// Normalize a directory, following symlinks all the way down.
fn normalize_dir(path: &Path) -> PathBuf {
    resolve_existing_prefix(&lexical_clean(&absolutize(Path::new("/"), path)))
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let expanded = expand_home(path);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

/// Check `candidate` against `git`'s worktree.
///
/// Bare repositories have no worktree, so every path is outside.
pub fn relativize(git: &Git, candidate: &Path) -> RelativePath {
    relativize_to(git.work_dir(), candidate)
}

/// Check `candidate` against an optional worktree root.
///
/// Relative candidates are joined to the root before the containment check,
/// so `..` cannot escape it unnoticed. The root itself counts as outside.
/// A symlink inside the root stays a path of its own, as git tracks it.
pub fn relativize_to(root: Option<&Path>, candidate: &Path) -> RelativePath {
    let Some(root) = root else {
        let absolute = match normalize(candidate) {
            Ok(p) => p,
            Err(_) => lexical_clean(candidate),
        };
        debug!(path = %candidate.display(), "no worktree, treating path as outside");
        return RelativePath {
            absolute,
            relative: None,
        };
    };

    let root = normalize_dir(root);
    let absolute = normalize_from(&root, candidate);

    let relative = match absolute.strip_prefix(&root) {
        Ok(rest) if rest.components().next().is_some() => Some(
            rest.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        ),
        _ => None,
    };

    if relative.is_none() {
        debug!(
            path = %candidate.display(),
            root = %root.display(),
            "path is outside the worktree"
        );
    }
    RelativePath { absolute, relative }
}

/// Replace a leading `~` with the home directory.
fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// Resolve `.` and `..` without touching the filesystem.
///
/// `..` at the root stays at the root.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let stacked = matches!(out.components().next_back(), Some(Component::ParentDir));
                if stacked || (!out.pop() && !out.has_root()) {
                    out.push(Component::ParentDir);
                }
            }
            Component::Prefix(_) | Component::RootDir => {
                out.push(component.as_os_str());
            }
            Component::Normal(part) => out.push(part),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(Component::CurDir);
    }
    out
}

/// Canonicalize the longest existing ancestor of `path` and re-append the rest.
fn resolve_existing_prefix(path: &Path) -> PathBuf {
    let mut tail: Vec<&std::ffi::OsStr> = Vec::new();
    let mut current = path;
    loop {
        if let Ok(resolved) = current.canonicalize() {
            let mut out = resolved;
            for part in tail.iter().rev() {
                out.push(part);
            }
            return out;
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name);
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Routing for idemgit's own files inside a repository's git directory.
///
/// Bare repositories route the same way: the git directory is the
/// repository itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    pub git_dir: PathBuf,
}

impl RepoPaths {
    pub fn new(git_dir: PathBuf) -> Self {
        Self { git_dir }
    }

    /// `<git_dir>/idemgit`
    pub fn repo_idemgit_dir(&self) -> PathBuf {
        self.git_dir.join("idemgit")
    }

    /// `<git_dir>/idemgit/config.toml`
    pub fn repo_config_path(&self) -> PathBuf {
        self.repo_idemgit_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    mod normalize {
        use super::*;

        #[test]
        fn lexical_clean_resolves_dots() {
            assert_eq!(lexical_clean(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
            assert_eq!(lexical_clean(Path::new("/../x")), PathBuf::from("/x"));
        }

        #[test]
        fn missing_tail_is_appended() {
            let dir = TempDir::new().unwrap();
            let root = dir.path().canonicalize().unwrap();
            let got = normalize_from(&root, Path::new("not/yet/here.txt"));
            assert_eq!(got, root.join("not").join("yet").join("here.txt"));
        }

        #[test]
        fn tilde_expands_to_home() {
            if let Some(home) = dirs::home_dir() {
                let got = normalize_from(Path::new("/"), Path::new("~/some-file"));
                assert!(got.ends_with("some-file"));
                assert!(got.starts_with(normalize_from(Path::new("/"), &home)));
            }
        }

        #[cfg(unix)]
        #[test]
        fn symlinked_prefix_is_resolved() {
            let dir = TempDir::new().unwrap();
            let real = dir.path().join("real");
            std::fs::create_dir(&real).unwrap();
            let link = dir.path().join("link");
            std::os::unix::fs::symlink(&real, &link).unwrap();

            let got = normalize_from(Path::new("/"), &link.join("file.txt"));
            assert_eq!(got, real.canonicalize().unwrap().join("file.txt"));
        }

        #[cfg(unix)]
        #[test]
        fn final_symlink_is_not_followed() {
            let dir = TempDir::new().unwrap();
            let root = dir.path().canonicalize().unwrap();
            std::fs::write(root.join("target.txt"), "x").unwrap();
            std::os::unix::fs::symlink("target.txt", root.join("link")).unwrap();

            assert_eq!(normalize_from(&root, Path::new("link")), root.join("link"));
        }
    }

    mod relativize {
        use super::*;

        #[test]
        fn relative_input_is_joined_to_root() {
            let dir = TempDir::new().unwrap();
            let rel = relativize_to(Some(dir.path()), Path::new("a/b.txt"));
            assert_eq!(rel.relative.as_deref(), Some("a/b.txt"));
        }

        #[test]
        fn absolute_input_inside_root() {
            let dir = TempDir::new().unwrap();
            let file = dir.path().join("x.txt");
            let rel = relativize_to(Some(dir.path()), &file);
            assert_eq!(rel.relative.as_deref(), Some("x.txt"));
        }

        #[test]
        fn dotdot_escape_is_outside() {
            let dir = TempDir::new().unwrap();
            let rel = relativize_to(Some(dir.path()), Path::new("../escape.txt"));
            assert!(!rel.inside_worktree());
        }

        #[test]
        fn root_itself_is_outside() {
            let dir = TempDir::new().unwrap();
            assert!(!relativize_to(Some(dir.path()), Path::new(".")).inside_worktree());
            assert!(!relativize_to(Some(dir.path()), dir.path()).inside_worktree());
        }

        #[test]
        fn sibling_with_shared_prefix_is_outside() {
            let dir = TempDir::new().unwrap();
            let root = dir.path().join("repo");
            std::fs::create_dir(&root).unwrap();
            let sibling = dir.path().join("repo-other").join("f.txt");
            assert!(!relativize_to(Some(&root), &sibling).inside_worktree());
        }

        #[cfg(unix)]
        #[test]
        fn symlink_inside_root_keeps_its_own_name() {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join("README.md"), "x").unwrap();
            std::os::unix::fs::symlink("README.md", dir.path().join("link")).unwrap();

            let rel = relativize_to(Some(dir.path()), Path::new("link"));
            assert_eq!(rel.relative.as_deref(), Some("link"));
        }

        #[cfg(unix)]
        #[test]
        fn symlinked_root_still_contains_its_files() {
            let dir = TempDir::new().unwrap();
            let real = dir.path().join("real");
            std::fs::create_dir(&real).unwrap();
            let alias = dir.path().join("alias");
            std::os::unix::fs::symlink(&real, &alias).unwrap();

            let via_alias = relativize_to(Some(&alias), &real.join("a.txt"));
            assert_eq!(via_alias.relative.as_deref(), Some("a.txt"));
            let via_real = relativize_to(Some(&real), &alias.join("a.txt"));
            assert_eq!(via_real.relative.as_deref(), Some("a.txt"));
        }

        #[test]
        fn no_worktree_is_outside() {
            assert!(!relativize_to(None, Path::new("/tmp/file")).inside_worktree());
        }
    }

    mod repo_paths {
        use super::*;

        #[test]
        fn config_lives_under_git_dir() {
            let paths = RepoPaths::new(PathBuf::from("/repo/.git"));
            assert_eq!(
                paths.repo_config_path(),
                PathBuf::from("/repo/.git/idemgit/config.toml")
            );
        }
    }
}
