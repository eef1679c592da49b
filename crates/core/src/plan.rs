//! In-memory plan tree.
//!
//! The plan is an arena of nodes. Containment is expressed with child id
//! lists on groups and a parent pointer on every node; dependencies are
//! plain identifier strings resolved later by [`crate::resolver`]. Nothing
//! holds a reference to another node, so the tree and the dependency graph
//! can be walked independently.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Position of a node in the plan arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Arena index of the node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Handle to a container node.
///
/// Only [`Plan::add_group`] hands these out, so children can never be
/// attached to a work package or milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(NodeId);

impl GroupId {
    /// The underlying node id.
    #[must_use]
    pub const fn node(self) -> NodeId {
        self.0
    }
}

impl From<GroupId> for NodeId {
    fn from(group: GroupId) -> Self {
        group.0
    }
}

/// Schedulable unit of work rendered as a bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPackage {
    /// Length in calendar days.
    pub duration_days: NonZeroU32,
    /// Explicit start; inferred from dependencies when absent.
    pub start_date: Option<NaiveDate>,
    /// Identifiers this work package must wait for.
    pub depends_on: Vec<String>,
    /// Colour grouping override.
    pub category: Option<String>,
}

impl WorkPackage {
    /// Work package with the given duration and nothing else set.
    #[must_use]
    pub const fn new(duration_days: NonZeroU32) -> Self {
        Self {
            duration_days,
            start_date: None,
            depends_on: Vec::new(),
            category: None,
        }
    }

    /// Set an explicit start date.
    #[must_use]
    pub fn starting(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Add dependencies, keeping declaration order.
    #[must_use]
    pub fn after<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(deps.into_iter().map(Into::into));
        self
    }
}

/// Zero-duration checkpoint rendered as a lozenge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Milestone {
    /// Explicit date; inferred from dependencies when absent.
    pub date: Option<NaiveDate>,
    /// Identifiers this milestone must wait for.
    pub depends_on: Vec<String>,
    /// Colour grouping override.
    pub category: Option<String>,
}

impl Milestone {
    /// Milestone fixed at `date`.
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    /// Add dependencies, keeping declaration order.
    #[must_use]
    pub fn after<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(deps.into_iter().map(Into::into));
        self
    }
}

/// Container node: category, phase, task or WBS branch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Group {
    /// Children in declaration order.
    pub children: Vec<NodeId>,
    /// Display colour hint for top-level categories.
    pub color: Option<String>,
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Leaf with a duration.
    WorkPackage(WorkPackage),
    /// Leaf with a single date.
    Milestone(Milestone),
    /// Container.
    Group(Group),
}

/// Discriminant of [`NodeKind`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Work package.
    WorkPackage,
    /// Milestone.
    Milestone,
    /// Group.
    Group,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WorkPackage => "work package",
            Self::Milestone => "milestone",
            Self::Group => "group",
        };
        f.write_str(s)
    }
}

/// A node in the plan arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanNode {
    /// Identifier, unique across the plan once validated.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Containing group, `None` for top-level nodes.
    pub parent: Option<NodeId>,
    /// Where the node was declared, e.g. `phases[0].items[2]`.
    pub location: Option<String>,
    /// Free-form `meta` mapping from the manifest, carried through untouched.
    pub meta: Option<serde_yaml::Value>,
    /// Node payload.
    pub kind: NodeKind,
}

impl PlanNode {
    /// The node's type.
    #[must_use]
    pub const fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::WorkPackage(_) => NodeType::WorkPackage,
            NodeKind::Milestone(_) => NodeType::Milestone,
            NodeKind::Group(_) => NodeType::Group,
        }
    }

    /// Declared dependencies; groups have none.
    #[must_use]
    pub fn depends_on(&self) -> &[String] {
        match &self.kind {
            NodeKind::WorkPackage(wp) => &wp.depends_on,
            NodeKind::Milestone(m) => &m.depends_on,
            NodeKind::Group(_) => &[],
        }
    }

    /// Explicit category override on a leaf.
    #[must_use]
    pub fn category_override(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::WorkPackage(wp) => wp.category.as_deref(),
            NodeKind::Milestone(m) => m.category.as_deref(),
            NodeKind::Group(_) => None,
        }
    }

    /// Work packages and milestones get dates; groups derive theirs.
    #[must_use]
    pub const fn is_schedulable(&self) -> bool {
        !matches!(self.kind, NodeKind::Group(_))
    }
}

/// A project plan: metadata plus the node arena.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    /// Project name, used as the chart title.
    pub name: String,
    /// Project-level anchor for items with neither a start nor dependencies.
    pub start_date: Option<NaiveDate>,
    /// Project-level `meta` mapping from the manifest.
    pub meta: Option<serde_yaml::Value>,
    nodes: Vec<PlanNode>,
    roots: Vec<NodeId>,
}

impl Plan {
    /// Create an empty plan.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the project start date.
    #[must_use]
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Append a group under `parent`, or at the top level.
    pub fn add_group(
        &mut self,
        parent: Option<GroupId>,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> GroupId {
        GroupId(self.push(
            parent,
            id.into(),
            name.into(),
            NodeKind::Group(Group::default()),
        ))
    }

    /// Append a work package under `parent`, or at the top level.
    pub fn add_work_package(
        &mut self,
        parent: Option<GroupId>,
        id: impl Into<String>,
        name: impl Into<String>,
        work_package: WorkPackage,
    ) -> NodeId {
        self.push(
            parent,
            id.into(),
            name.into(),
            NodeKind::WorkPackage(work_package),
        )
    }

    /// Append a milestone under `parent`, or at the top level.
    pub fn add_milestone(
        &mut self,
        parent: Option<GroupId>,
        id: impl Into<String>,
        name: impl Into<String>,
        milestone: Milestone,
    ) -> NodeId {
        self.push(
            parent,
            id.into(),
            name.into(),
            NodeKind::Milestone(milestone),
        )
    }

    fn push(
        &mut self,
        parent: Option<GroupId>,
        id: String,
        name: String,
        kind: NodeKind,
    ) -> NodeId {
        let node_id = NodeId::new(self.nodes.len());
        self.nodes.push(PlanNode {
            id,
            name,
            parent: parent.map(GroupId::node),
            location: None,
            meta: None,
            kind,
        });

        match parent {
            Some(group) => {
                if let NodeKind::Group(g) = &mut self.nodes[group.node().index()].kind {
                    g.children.push(node_id);
                }
            }
            None => self.roots.push(node_id),
        }

        node_id
    }

    /// Record where a node was declared.
    pub fn set_location(&mut self, id: impl Into<NodeId>, location: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(id.into().index()) {
            node.location = Some(location.into());
        }
    }

    /// Attach manifest metadata to a node.
    pub fn set_meta(&mut self, id: impl Into<NodeId>, meta: serde_yaml::Value) {
        if let Some(node) = self.nodes.get_mut(id.into().index()) {
            node.meta = Some(meta);
        }
    }

    /// Set the colour hint of a group.
    pub fn set_color(&mut self, group: GroupId, color: impl Into<String>) {
        if let NodeKind::Group(g) = &mut self.nodes[group.node().index()].kind {
            g.color = Some(color.into());
        }
    }

    /// Look up a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this plan.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &PlanNode {
        &self.nodes[id.index()]
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the plan has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level nodes in declaration order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Children of a node; empty for leaves.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            NodeKind::Group(g) => &g.children,
            _ => &[],
        }
    }

    /// Pre-order walk in document order, yielding `(id, depth)`.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            plan: self,
            stack: self.roots.iter().rev().map(|&id| (id, 0)).collect(),
        }
    }

    /// Outermost ancestor of a node (the node itself when top-level).
    #[must_use]
    pub fn top_level_ancestor(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            current = parent;
        }
        current
    }

    /// Human-readable location of a node for error messages.
    ///
    /// Uses the recorded source location when there is one, otherwise the
    /// chain of identifiers from the top level down.
    #[must_use]
    pub fn location(&self, id: NodeId) -> String {
        if let Some(location) = &self.node(id).location {
            return location.clone();
        }

        let mut chain = vec![self.node(id).id.as_str()];
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            chain.push(self.node(parent).id.as_str());
            current = parent;
        }
        chain.reverse();
        chain.join(" / ")
    }
}

/// Pre-order iterator over a [`Plan`].
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    plan: &'a Plan,
    stack: Vec<(NodeId, usize)>,
}

impl Iterator for Walk<'_> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        self.stack.extend(
            self.plan
                .children(id)
                .iter()
                .rev()
                .map(|&child| (child, depth + 1)),
        );
        Some((id, depth))
    }
}
