//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Report and failure rendering, verbosity handling
//!
//! # Design
//!
//! All stdout/stderr writes from the binary go through this module so that
//! `--quiet` and `--json` are honored in one place. Diagnostics use
//! `tracing` instead.

pub mod output;
