//! Date computation for resolved plans.
//!
//! Dates are calendar days with an end-exclusive convention: a one-day work
//! package starting on the 4th ends on the 5th, and a dependent may start on
//! the 5th. Milestones have `start == end`.

use crate::config::SchedulerConfig;
use crate::plan::{NodeId, NodeKind, Plan};
use crate::resolver::ResolvedPlan;
use crate::{Error, Result};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Half-open range of calendar days `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateSpan {
    /// First day.
    pub start: NaiveDate,
    /// Day after the last day; equal to `start` for milestones.
    pub end: NaiveDate,
}

impl DateSpan {
    /// Span from `start` to `end`.
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Zero-length span on a single date.
    #[must_use]
    pub const fn point(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Length in days.
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Smallest span covering both.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Computed dates for every node of a plan.
///
/// Leaves always have a span once scheduling succeeds; groups have one when
/// at least one descendant is dated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    spans: Vec<Option<DateSpan>>,
}

impl Schedule {
    /// Span of a node.
    #[must_use]
    pub fn span(&self, id: NodeId) -> Option<DateSpan> {
        self.spans.get(id.index()).copied().flatten()
    }

    /// Range covering every dated node, used for the chart window.
    #[must_use]
    pub fn plan_span(&self) -> Option<DateSpan> {
        self.spans.iter().flatten().copied().reduce(DateSpan::union)
    }

    /// Dated nodes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, DateSpan)> + '_ {
        self.spans
            .iter()
            .enumerate()
            .filter_map(|(i, span)| span.map(|s| (NodeId::new(i), s)))
    }
}

/// The dependency that constrains a leaf the most.
struct Constraint<'a> {
    id: &'a str,
    end: NaiveDate,
}

/// Compute dates for every node.
///
/// Leaves are visited in the resolved order, so each dependency is dated
/// before its dependents. Group spans are then derived bottom-up.
///
/// # Errors
///
/// - [`Error::PrecedenceViolation`] when an explicit date precedes the end of
///   a dependency; the latest-ending dependency is reported.
/// - [`Error::MissingStartDate`] when a leaf has neither a date nor
///   dependencies and no default start is available.
/// - [`Error::DateOutOfRange`] when an end date overflows the calendar.
#[instrument(skip_all, fields(plan = %plan.name))]
pub fn schedule(
    plan: &Plan,
    resolved: &ResolvedPlan,
    config: &SchedulerConfig,
) -> Result<Schedule> {
    let anchor = default_start(plan, config);
    debug!(?anchor, "Default start");

    let mut spans: Vec<Option<DateSpan>> = vec![None; plan.len()];

    for &id in resolved.order() {
        let node = plan.node(id);
        let constraint = latest_dependency(plan, resolved, &spans, id)?;

        let (explicit, duration) = match &node.kind {
            NodeKind::WorkPackage(wp) => (wp.start_date, u64::from(wp.duration_days.get())),
            NodeKind::Milestone(m) => (m.date, 0),
            NodeKind::Group(_) => continue,
        };

        let start = match (explicit, &constraint) {
            (Some(start), Some(dep)) if start < dep.end => {
                return Err(Error::PrecedenceViolation {
                    id: node.id.clone(),
                    dependency: dep.id.to_string(),
                    required_start: dep.end,
                    actual_start: start,
                });
            }
            (Some(start), _) => start,
            (None, Some(dep)) => dep.end,
            (None, None) => anchor.ok_or_else(|| Error::MissingStartDate {
                id: node.id.clone(),
            })?,
        };

        let end = start
            .checked_add_days(Days::new(duration))
            .ok_or_else(|| Error::DateOutOfRange {
                id: node.id.clone(),
            })?;

        spans[id.index()] = Some(DateSpan::new(start, end));
    }

    // Reverse pre-order visits every child before its parent.
    let walk: Vec<NodeId> = plan.walk().map(|(id, _)| id).collect();
    for &id in walk.iter().rev() {
        if plan.node(id).is_schedulable() {
            continue;
        }
        spans[id.index()] = plan
            .children(id)
            .iter()
            .filter_map(|child| spans[child.index()])
            .reduce(DateSpan::union);
    }

    let schedule = Schedule { spans };
    if let Some(span) = schedule.plan_span() {
        info!(start = %span.start, end = %span.end, "Scheduled plan");
    }
    Ok(schedule)
}

/// Anchor for leaves with neither a date nor dependencies.
///
/// Configured default, then the plan's start date, then the earliest explicit
/// date anywhere in the plan.
fn default_start(plan: &Plan, config: &SchedulerConfig) -> Option<NaiveDate> {
    config.default_start.or(plan.start_date).or_else(|| {
        plan.walk()
            .filter_map(|(id, _)| match &plan.node(id).kind {
                NodeKind::WorkPackage(wp) => wp.start_date,
                NodeKind::Milestone(m) => m.date,
                NodeKind::Group(_) => None,
            })
            .min()
    })
}

fn latest_dependency<'a>(
    plan: &'a Plan,
    resolved: &ResolvedPlan,
    spans: &[Option<DateSpan>],
    id: NodeId,
) -> Result<Option<Constraint<'a>>> {
    let mut latest: Option<Constraint<'a>> = None;

    for dep in plan.node(id).depends_on() {
        let span = resolved
            .lookup(dep)
            .and_then(|dep_id| spans[dep_id.index()])
            .ok_or_else(|| {
                Error::internal(format!(
                    "dependency '{dep}' of '{}' was not scheduled first",
                    plan.node(id).id
                ))
            })?;

        // Strictly later only, so the first declared dependency wins ties.
        if latest.as_ref().is_none_or(|l| span.end > l.end) {
            latest = Some(Constraint {
                id: dep,
                end: span.end,
            });
        }
    }

    Ok(latest)
}
