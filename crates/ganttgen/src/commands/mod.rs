//! Command implementations
//!
//! Each command returns the text to print on stdout; the binary decides
//! where it goes and how errors are rendered.

pub mod check;
pub mod render;
pub mod rows;
pub mod view;

use crate::cli::{CliError, Commands, OkEnvelope};
use serde::Serialize;

/// Run a parsed subcommand.
///
/// # Errors
///
/// Returns the first error raised by loading, scheduling or rendering.
pub fn execute(command: Commands, json_mode: bool) -> Result<String, CliError> {
    match command {
        Commands::Render(args) => render::execute_render(&args, json_mode),
        Commands::Check { plan, schedule } => check::execute_check(&plan, &schedule, json_mode),
        Commands::Rows { plan, schedule } => rows::execute_rows(&plan, &schedule, json_mode),
    }
}

/// Serialize a success payload, wrapped in an envelope in JSON mode.
pub(crate) fn to_json<T: Serialize>(data: &T, json_mode: bool) -> Result<String, CliError> {
    let result = if json_mode {
        serde_json::to_string(&OkEnvelope::new(data))
    } else {
        serde_json::to_string_pretty(data)
    };
    result.map_err(|e| CliError::other(format!("Failed to serialize output: {e}")))
}
