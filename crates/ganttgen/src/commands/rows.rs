//! `ganttgen rows`: dump the flattened schedule

use super::to_json;
use crate::cli::{CliError, ScheduleArgs};
use ganttgen_core::load_and_run;
use std::path::Path;
use tracing::debug;

/// Execute the rows command.
///
/// Prints the rows as pretty JSON, or as a compact envelope in JSON mode.
///
/// # Errors
///
/// Returns the first validation or scheduling error in the plan.
pub fn execute_rows(
    path: &Path,
    schedule: &ScheduleArgs,
    json_mode: bool,
) -> Result<String, CliError> {
    let (_, scheduled) = load_and_run(path, &schedule.to_config())?;
    debug!(rows = scheduled.rows.len(), "Serializing rows");
    to_json(&scheduled.rows, json_mode)
}
