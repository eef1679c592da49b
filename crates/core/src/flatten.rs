//! Flattening of a scheduled plan into render rows.

use crate::plan::{NodeId, NodeKind, Plan, Walk};
use crate::schedule::{DateSpan, Schedule};
use crate::{Error, Result};
use serde::Serialize;

/// What a row draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// Top-level group heading.
    Category,
    /// Nested group bracket.
    Group,
    /// Bar.
    WorkPackage,
    /// Diamond.
    Milestone,
}

impl RowKind {
    /// Whether the row is a group heading of either level.
    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(self, Self::Category | Self::Group)
    }
}

/// One line of the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderRow {
    /// Position in the flattened sequence, from zero.
    pub order: usize,
    /// Node identifier.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Nesting depth, zero at the top level.
    pub depth: usize,
    /// Row kind.
    pub kind: RowKind,
    /// Scheduled dates; `None` only for groups without dated descendants.
    pub span: Option<DateSpan>,
    /// Colour grouping key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Declared dependencies, for connectors.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Colour declared on the group, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Options for [`flatten`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Emit heading rows for groups.
    pub include_groups: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            include_groups: true,
        }
    }
}

/// Lazy row sequence produced by [`flatten`].
///
/// Call [`flatten`] again to start over; the iterator holds no state beyond
/// its own position.
#[derive(Debug, Clone)]
pub struct RenderRows<'a> {
    plan: &'a Plan,
    schedule: &'a Schedule,
    options: FlattenOptions,
    walk: Walk<'a>,
    emitted: usize,
}

/// Walk the plan in document order and produce one row per leaf, plus one
/// per group when enabled.
#[must_use]
pub fn flatten<'a>(
    plan: &'a Plan,
    schedule: &'a Schedule,
    options: FlattenOptions,
) -> RenderRows<'a> {
    RenderRows {
        plan,
        schedule,
        options,
        walk: plan.walk(),
        emitted: 0,
    }
}

/// Collect every row.
///
/// # Errors
///
/// Returns [`Error::InconsistentSchedule`] when a leaf has no dates.
pub fn collect_rows(
    plan: &Plan,
    schedule: &Schedule,
    options: FlattenOptions,
) -> Result<Vec<RenderRow>> {
    flatten(plan, schedule, options).collect()
}

impl RenderRows<'_> {
    fn category_key(&self, id: NodeId) -> Option<String> {
        let node = self.plan.node(id);
        if let Some(category) = node.category_override() {
            return Some(category.to_string());
        }

        let top = self.plan.top_level_ancestor(id);
        let top_node = self.plan.node(top);
        matches!(top_node.kind, NodeKind::Group(_)).then(|| top_node.id.clone())
    }

    fn row(&self, id: NodeId, depth: usize) -> Result<RenderRow> {
        let node = self.plan.node(id);
        let span = self.schedule.span(id);

        let color = match &node.kind {
            NodeKind::Group(g) => g.color.clone(),
            _ => None,
        };
        let kind = match node.kind {
            NodeKind::Group(_) if depth == 0 => RowKind::Category,
            NodeKind::Group(_) => RowKind::Group,
            NodeKind::WorkPackage(_) => RowKind::WorkPackage,
            NodeKind::Milestone(_) => RowKind::Milestone,
        };
        if !kind.is_group() && span.is_none() {
            return Err(Error::InconsistentSchedule {
                id: node.id.clone(),
            });
        }

        Ok(RenderRow {
            order: self.emitted,
            id: node.id.clone(),
            label: node.name.clone(),
            depth,
            kind,
            span,
            category: self.category_key(id),
            depends_on: node.depends_on().to_vec(),
            color,
        })
    }
}

impl Iterator for RenderRows<'_> {
    type Item = Result<RenderRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (id, depth) = self.walk.next()?;
            if !self.options.include_groups && !self.plan.node(id).is_schedulable() {
                continue;
            }

            let row = self.row(id, depth);
            self.emitted += 1;
            return Some(row);
        }
    }
}
