//! ganttgen - Gantt charts from YAML project plans
//!
//! The binary is a thin shell over this library:
//! - [`cli`] parses arguments and maps errors to exit codes
//! - [`commands`] runs the scheduling pipeline and the renderer
//! - [`tracing`] configures logging to stderr
//!
//! Scheduling lives in `ganttgen-core` and drawing in `ganttgen-render`.

// The CLI prints command output and error reports.
#![allow(clippy::print_stdout, clippy::print_stderr)]

/// CLI argument parsing and exit codes.
pub mod cli;
/// Command implementations (render, check, rows).
pub mod commands;
/// Tracing and logging configuration.
pub mod tracing;

pub use cli::{CliError, EXIT_OK, EXIT_OTHER, EXIT_PLAN};
