//! `ganttgen check`: validate and schedule without rendering

use super::to_json;
use crate::cli::{CliError, ScheduleArgs};
use chrono::NaiveDate;
use ganttgen_core::{RenderRow, RowKind, load_and_run};
use serde::Serialize;
use std::fmt::{Display, Write};
use std::path::Path;

/// Summary of a valid plan
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CheckOutput {
    /// Plan name.
    pub name: String,
    /// Number of work packages.
    pub work_packages: usize,
    /// Number of milestones.
    pub milestones: usize,
    /// Number of groups at any level.
    pub groups: usize,
    /// First scheduled day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    /// Day after the last scheduled day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl CheckOutput {
    fn from_rows(
        name: &str,
        rows: &[RenderRow],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Self {
        let count = |kind: RowKind| rows.iter().filter(|r| r.kind == kind).count();
        Self {
            name: name.to_string(),
            work_packages: count(RowKind::WorkPackage),
            milestones: count(RowKind::Milestone),
            groups: rows.iter().filter(|r| r.kind.is_group()).count(),
            start,
            end,
        }
    }

    fn to_text(&self) -> String {
        let mut out = format!(
            "Plan '{}' is valid: {}, {}, {}",
            self.name,
            plural(self.work_packages, "work package"),
            plural(self.milestones, "milestone"),
            plural(self.groups, "group"),
        );
        if let (Some(start), Some(end)) = (self.start, self.end) {
            let days = (end - start).num_days();
            let span = plural(days, "day");
            let _ = write!(out, "\nScheduled from {start} to {end} ({span})");
        }
        out
    }
}

fn plural<N: Display + PartialEq + From<u8>>(n: N, noun: &str) -> String {
    if n == N::from(1) {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// Execute the check command.
///
/// # Errors
///
/// Returns the first validation or scheduling error in the plan.
pub fn execute_check(
    path: &Path,
    schedule: &ScheduleArgs,
    json_mode: bool,
) -> Result<String, CliError> {
    let (plan, scheduled) = load_and_run(path, &schedule.to_config())?;
    let output = CheckOutput::from_rows(
        &plan.name,
        &scheduled.rows,
        scheduled.span.map(|s| s.start),
        scheduled.span.map(|s| s.end),
    );

    if json_mode {
        to_json(&output, true)
    } else {
        Ok(output.to_text())
    }
}
