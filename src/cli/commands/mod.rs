//! cli::commands
//!
//! Command dispatch.
//!
//! # Architecture
//!
//! Each subcommand maps onto one task parameter struct. Dispatch:
//! 1. Builds the task from the parsed arguments
//! 2. Runs it
//! 3. Renders the report through [`crate::ui::output`]
//!
//! Handlers do NOT touch the repository directly.

mod credentials;

use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use crate::cli::args::Command;
use crate::tasks::add::AddTask;
use crate::tasks::branch::BranchTask;
use crate::tasks::checkout::CheckoutTask;
use crate::tasks::clone::CloneTask;
use crate::tasks::commit::CommitTask;
use crate::tasks::init::InitTask;
use crate::tasks::push::PushTask;
use crate::tasks::restore::RestoreTask;
use crate::tasks::tag::TagTask;
use crate::tasks::Task;
use crate::ui::output::{self, Format, Verbosity};

/// Execution context shared by all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Repository the command operates on
    pub repo: PathBuf,
    pub format: Format,
    pub verbosity: Verbosity,
}

/// Dispatch a command to its task.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init { path, bare } => execute(
            InitTask {
                path: path.unwrap_or_else(|| ctx.repo.clone()),
                bare,
            },
            ctx,
        ),
        Command::Clone {
            upstream,
            path,
            bare,
            branch,
            credentials: creds,
        } => execute(
            CloneTask {
                upstream,
                path,
                bare,
                branch,
                credentials: credentials::from_args(&creds)?,
            },
            ctx,
        ),
        Command::Add { files } => execute(
            AddTask {
                path: ctx.repo.clone(),
                files,
            },
            ctx,
        ),
        Command::Commit {
            branch,
            message,
            author,
            email,
        } => execute(
            CommitTask {
                path: ctx.repo.clone(),
                branch,
                message,
                author,
                email,
            },
            ctx,
        ),
        Command::Branch {
            name,
            action,
            parent,
        } => execute(
            BranchTask {
                path: ctx.repo.clone(),
                action: action.into(),
                name,
                parent,
            },
            ctx,
        ),
        Command::Checkout {
            branch,
            files,
            force,
        } => execute(
            CheckoutTask {
                path: ctx.repo.clone(),
                branch,
                files,
                force,
            },
            ctx,
        ),
        Command::Restore {
            files,
            source,
            mode,
        } => execute(
            RestoreTask {
                path: ctx.repo.clone(),
                files,
                source,
                mode: mode.into(),
            },
            ctx,
        ),
        Command::Tag {
            tag,
            action,
            reference,
            message,
            author,
            email,
        } => execute(
            TagTask {
                path: ctx.repo.clone(),
                action: action.into(),
                tag,
                reference,
                message,
                author,
                email,
            },
            ctx,
        ),
        Command::Push {
            remote,
            branches,
            tags,
            credentials: creds,
        } => execute(
            PushTask {
                path: ctx.repo.clone(),
                remote,
                branches,
                tags,
                credentials: credentials::from_args(&creds)?,
            },
            ctx,
        ),
    }
}

/// Run a task and render its report.
fn execute<T: Task>(task: T, ctx: &Context) -> Result<()> {
    debug!(task = T::NAME, repo = %ctx.repo.display(), "running task");
    let report = task.run()?;
    debug!(task = T::NAME, changed = report.changed, "task finished");
    output::report(&report, ctx.format, ctx.verbosity)?;
    Ok(())
}
