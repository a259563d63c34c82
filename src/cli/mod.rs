//! cli
//!
//! Command-line interface layer for idemgit.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to [`crate::tasks`] through [`commands::dispatch`]
//! - Turn failures into a failure report and a non-zero exit code
//!
//! The CLI layer is thin. It never opens a repository itself.

pub mod args;
pub mod commands;

use std::process::ExitCode;

pub use args::Cli;
pub use commands::Context;

use crate::ui::output::{self, FailureReport, Format, Verbosity};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`, after logging is set
/// up from the same parsed flags.
pub fn run(cli: Cli) -> ExitCode {
    let ctx = Context {
        repo: cli.repo.clone(),
        format: Format::from_flag(cli.json),
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    match commands::dispatch(cli.command, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            output::failure(&FailureReport::from_anyhow(&err), ctx.format);
            ExitCode::FAILURE
        }
    }
}
