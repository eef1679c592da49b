//! Scheduling and validation engine for ganttgen
//!
//! This crate turns a hierarchical project plan into validated, dated render
//! rows:
//! - [`plan`]: the in-memory plan tree
//! - [`manifest`]: YAML plan manifests
//! - [`resolver`]: identifier indexing, dependency checks and ordering
//! - [`schedule`]: start/end dates with finish-to-start precedence
//! - [`flatten`]: render rows in document order
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use ganttgen_core::plan::{Plan, WorkPackage};
//! use ganttgen_core::{SchedulerConfig, run};
//! use std::num::NonZeroU32;
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
//! let mut plan = Plan::new("Demo").with_start_date(start);
//! let build = plan.add_group(None, "build", "Build");
//! plan.add_work_package(Some(build), "a", "A", WorkPackage::new(NonZeroU32::new(3).unwrap()));
//! plan.add_work_package(
//!     Some(build),
//!     "b",
//!     "B",
//!     WorkPackage::new(NonZeroU32::new(2).unwrap()).after(["a"]),
//! );
//!
//! let scheduled = run(&plan, &SchedulerConfig::default()).unwrap();
//! assert_eq!(scheduled.rows.len(), 3);
//! ```

pub mod config;
mod error;
pub mod flatten;
pub mod manifest;
pub mod plan;
pub mod resolver;
pub mod schedule;

pub use config::SchedulerConfig;
pub use error::{Error, Result};
pub use flatten::{FlattenOptions, RenderRow, RowKind, collect_rows, flatten};
pub use manifest::{LoadedPlan, ManifestError, load_plan, parse_plan};
pub use plan::{NodeId, NodeType, Plan};
pub use resolver::{ResolvedPlan, resolve};
pub use schedule::{DateSpan, Schedule, schedule};

use std::path::Path;
use tracing::{info, instrument};

/// Output of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledPlan {
    /// Rows in document order, groups included.
    pub rows: Vec<RenderRow>,
    /// Range covering every dated node; `None` for a plan without leaves.
    pub span: Option<DateSpan>,
    /// Dates per node.
    pub schedule: Schedule,
}

/// Resolve, schedule and flatten a plan.
///
/// # Errors
///
/// Returns the first validation or scheduling error encountered; nothing is
/// produced for a plan that fails.
#[instrument(skip_all, fields(plan = %plan.name))]
pub fn run(plan: &Plan, config: &SchedulerConfig) -> Result<ScheduledPlan> {
    let resolved = resolve(plan, config)?;
    let schedule = schedule(plan, &resolved, config)?;
    let rows = collect_rows(plan, &schedule, FlattenOptions::default())?;
    let span = schedule.plan_span();

    info!(rows = rows.len(), "Plan scheduled");
    Ok(ScheduledPlan {
        rows,
        span,
        schedule,
    })
}

/// Load a manifest and run the pipeline on it.
///
/// `overrides` is merged over the manifest's own settings.
///
/// # Errors
///
/// Returns I/O and manifest errors from loading, then anything [`run`]
/// returns.
pub fn load_and_run(path: &Path, overrides: &SchedulerConfig) -> Result<(Plan, ScheduledPlan)> {
    let LoadedPlan { plan, config } = load_plan(path)?;
    let config = config.merged_with(overrides);
    let scheduled = run(&plan, &config)?;
    Ok((plan, scheduled))
}
