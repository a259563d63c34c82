//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Reports go to stdout, diagnostics to stderr. Text output is the report
//! message alone; `--json` prints the whole report as one JSON object so
//! automation can read `changed` and the payload.

use std::fmt::Display;

use serde::Serialize;

use crate::tasks::{TaskError, TaskReport};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn from_flag(json: bool) -> Self {
        if json {
            Format::Json
        } else {
            Format::Text
        }
    }
}

/// Failure report, shaped like a task report so callers can branch on
/// `failed` without parsing stderr.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub failed: bool,
    pub msg: String,
    pub exception: String,
}

impl FailureReport {
    pub fn new(msg: impl Into<String>, exception: impl Into<String>) -> Self {
        Self {
            failed: true,
            msg: msg.into(),
            exception: exception.into(),
        }
    }

    /// Transport failures keep the underlying cause as the exception text.
    pub fn from_task_error(err: &TaskError) -> Self {
        match err {
            TaskError::TransportFailure { message, cause } => Self::new(message, cause),
            other => Self::new(other.to_string(), other.kind()),
        }
    }

    /// Fallback for errors raised outside a task.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<TaskError>() {
            Some(task_err) => Self::from_task_error(task_err),
            None => Self::new(format!("{:#}", err), "Error"),
        }
    }
}

/// Render a task report.
///
/// JSON is printed even in quiet mode; the caller asked for a machine
/// readable result.
pub fn report<P: Serialize>(
    report: &TaskReport<P>,
    format: Format,
    verbosity: Verbosity,
) -> serde_json::Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(report)?),
        Format::Text => {
            print(&report.message, verbosity);
            if verbosity == Verbosity::Debug {
                debug(serde_json::to_string_pretty(report)?, verbosity);
            }
        }
    }
    Ok(())
}

/// Render a failure.
pub fn failure(failure: &FailureReport, format: Format) {
    match format {
        Format::Json => match serde_json::to_string(failure) {
            Ok(line) => println!("{}", line),
            Err(_) => error(&failure.msg),
        },
        Format::Text => error(&failure.msg),
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    mod verbosity {
        use super::*;

        #[test]
        fn quiet_wins_over_debug() {
            assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
            assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
            assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        }
    }

    mod failure_report {
        use super::*;

        #[test]
        fn transport_failure_splits_message_and_cause() {
            let err = TaskError::TransportFailure {
                message: "failed to push refs a to origin".into(),
                cause: "remote rejected".into(),
            };
            let report = FailureReport::from_task_error(&err);
            assert!(report.failed);
            assert_eq!(report.msg, "failed to push refs a to origin");
            assert_eq!(report.exception, "remote rejected");
        }

        #[test]
        fn other_errors_use_kind() {
            let err = TaskError::invalid_state("either branch or tags must be defined");
            let report = FailureReport::from_task_error(&err);
            assert_eq!(report.msg, "either branch or tags must be defined");
            assert_eq!(report.exception, "InvalidState");
        }

        #[test]
        fn anyhow_wrapping_a_task_error_is_unwrapped() {
            let err = anyhow::Error::new(TaskError::not_found("failed to get remote up"));
            let report = FailureReport::from_anyhow(&err);
            assert_eq!(report.exception, "NotFound");
        }

        #[test]
        fn serializes_with_failed_flag() {
            let value = serde_json::to_value(FailureReport::new("boom", "Error")).unwrap();
            assert_eq!(value["failed"], true);
            assert_eq!(value["msg"], "boom");
            assert_eq!(value["exception"], "Error");
        }
    }
}
