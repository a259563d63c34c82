//! core
//!
//! Core domain types and the shared resolution logic every task depends on.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, RefName, Credentials
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Path normalization and worktree containment
//! - [`resolve`] - Ref-ish canonicalization and commit resolution
//! - [`status`] - Sparse tree/index/workdir status classification
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Out-of-tree paths and missing refs are values, not errors
//! - Status is always a comparison of exactly two sides

pub mod config;
pub mod paths;
pub mod resolve;
pub mod status;
pub mod types;
