//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. Object storage, the index,
//! checkout and network transport all live behind [`Git`]. No other module
//! imports `git2`, and nothing shells out to the git CLI.
//!
//! # Responsibilities
//!
//! - Repository discovery, opening, creation and cloning
//! - HEAD inspection and revision parsing
//! - Branch and tag creation/deletion
//! - Explicit index snapshots ([`IndexSnapshot`])
//! - Tree-vs-index and index-vs-workdir diffs as raw [`Change`]s
//! - Commit creation and tree checkout
//! - Push with a credential provider
//!
//! # Invariants
//!
//! - The index is only written through [`Git::persist_index`]
//! - All operations return strong types (Oid, BranchName, RefName)
//! - Failures are categorized as [`GitError`] with context

mod interface;

pub use interface::{
    Change, ChangeKind, CheckoutStrategy, CommitInfo, Git, GitError, IndexSnapshot, PushSummary,
    TreeEntry,
};
