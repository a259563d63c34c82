//! Property-based tests for path containment and name validation.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::path::{Path, PathBuf};

use proptest::prelude::*;

use idemgit::core::paths::{normalize_from, relativize_to};
use idemgit::core::types::{BranchName, RefName};

/// Root used for lexical checks; it does not exist, so nothing resolves
/// through the filesystem.
const ROOT: &str = "/nonexistent-root/repo";

/// One path component, including the awkward ones.
fn component() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z0-9_-]{1,8}",
        1 => Just(".".to_string()),
        2 => Just("..".to_string()),
        1 => Just("repo".to_string()),
    ]
}

fn relative_path() -> impl Strategy<Value = PathBuf> {
    prop::collection::vec(component(), 1..8).prop_map(|parts| parts.iter().collect())
}

/// Strategy for generating valid branch names.
fn valid_branch_name() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Z0-9][a-zA-Z0-9_-]{0,9}", 1..4).prop_map(|parts| parts.join("/"))
}

proptest! {
    /// A path is inside the worktree iff its normal form descends from the
    /// root and is not the root itself.
    #[test]
    fn relativize_agrees_with_normalized_ancestry(candidate in relative_path()) {
        let root = Path::new(ROOT);
        let result = relativize_to(Some(root), &candidate);
        let normalized = normalize_from(root, &candidate);

        let descends = normalized.starts_with(root) && normalized != root;
        prop_assert_eq!(result.inside_worktree(), descends);
        prop_assert_eq!(&result.absolute, &normalized);
    }

    /// Relative results never climb out of the root.
    #[test]
    fn relative_paths_never_escape(candidate in relative_path()) {
        let result = relativize_to(Some(Path::new(ROOT)), &candidate);
        if let Some(relative) = result.relative {
            prop_assert!(!relative.is_empty());
            prop_assert!(!relative.starts_with('/'));
            prop_assert!(relative.split('/').all(|c| c != ".." && c != "." && !c.is_empty()));
            prop_assert_eq!(Path::new(ROOT).join(&relative), result.absolute);
        }
    }

    /// Absolute candidates give the same answer as their relative spelling.
    #[test]
    fn absolute_and_relative_spellings_agree(candidate in relative_path()) {
        let root = Path::new(ROOT);
        let relative = relativize_to(Some(root), &candidate);
        let absolute = relativize_to(Some(root), &root.join(&candidate));
        prop_assert_eq!(relative.relative, absolute.relative);
    }

    /// Without a worktree nothing is inside.
    #[test]
    fn no_worktree_means_outside(candidate in relative_path()) {
        let result = relativize_to(None, &Path::new(ROOT).join(candidate));
        prop_assert!(!result.inside_worktree());
    }

    /// Normalizing twice changes nothing.
    #[test]
    fn normalization_is_idempotent(candidate in relative_path()) {
        let root = Path::new(ROOT);
        let once = normalize_from(root, &candidate);
        let twice = normalize_from(root, &once);
        prop_assert_eq!(once, twice);
    }

    /// Valid branch names always form a branch ref that round trips.
    #[test]
    fn branch_names_form_branch_refs(name in valid_branch_name()) {
        let branch = BranchName::new(name.as_str()).unwrap();
        let refname = RefName::for_branch(&branch);
        prop_assert!(refname.is_branch_ref());
        prop_assert_eq!(refname.shorthand(), name.as_str());
    }

    /// Names containing `..` are always rejected.
    #[test]
    fn double_dots_are_rejected(prefix in "[a-z]{0,5}", suffix in "[a-z]{0,5}") {
        let name = format!("{}..{}", prefix, suffix);
        prop_assert!(BranchName::new(name).is_err());
    }
}
