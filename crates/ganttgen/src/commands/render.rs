//! `ganttgen render`: schedule a plan and write the chart

use super::{to_json, view};
use crate::cli::{CliError, RenderArgs};
use ganttgen_core::load_and_run;
use ganttgen_render::{RenderOptions, write_svg};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Serialize)]
struct RenderOutput {
    path: PathBuf,
    rows: usize,
}

/// Execute the render command.
///
/// The viewer is opened on a best-effort basis; failing to open it does not
/// fail the command.
///
/// # Errors
///
/// Returns plan errors from loading and scheduling, and render errors from
/// drawing or writing the chart.
pub fn execute_render(args: &RenderArgs, json_mode: bool) -> Result<String, CliError> {
    let (plan, scheduled) = load_and_run(&args.plan, &args.schedule.to_config())?;

    let options = RenderOptions {
        title: plan.name.clone(),
        min_date: args.min_date,
        max_date: args.max_date,
        year: args.year,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    write_svg(&scheduled.rows, &args.out, &options)?;
    info!(path = %args.out.display(), "Chart written");

    if args.should_view() {
        view::open(&args.out);
    }

    if json_mode {
        to_json(
            &RenderOutput {
                path: args.out.clone(),
                rows: scheduled.rows.len(),
            },
            true,
        )
    } else {
        Ok(format!("Wrote {}", args.out.display()))
    }
}
