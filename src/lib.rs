//! idemgit - idempotent Git tasks for automation
//!
//! idemgit drives a local Git repository toward a requested state: a
//! repository exists, files are staged, a commit is recorded, a branch or
//! tag exists, refs are pushed. Every task reports whether it changed
//! anything, so re-running one whose goal already holds is a no-op.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to tasks)
//! - [`tasks`] - Caller-facing operations returning `TaskReport`s
//! - [`engine`] - Multi-step index workflows: stage, commit, restore
//! - [`core`] - Domain types, configuration, paths, name resolution, status
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Output rendering
//!
//! # Correctness Invariants
//!
//! 1. Only [`git`] talks to the object store
//! 2. The index is loaded once per task and written back at most once
//! 3. Paths outside the worktree are skipped, never staged or written
//! 4. Conflicted paths stop staging and restore before anything is written

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod tasks;
pub mod ui;
