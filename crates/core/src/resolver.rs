//! Dependency resolution over the plan tree.
//!
//! Indexes every node by identifier, maps work packages and milestones onto
//! a [`DependencyGraph`], and returns the order in which the scheduler must
//! visit them.

use crate::config::SchedulerConfig;
use crate::plan::{NodeId, NodeKind, NodeType, Plan};
use crate::{Error, Result};
use ganttgen_dep_graph::{DependencyGraph, GraphNodeData};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlan {
    order: Vec<NodeId>,
    index: HashMap<String, NodeId>,
}

impl ResolvedPlan {
    /// Schedulable nodes, dependencies first, ties in document order.
    #[must_use]
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Node registered under an identifier.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }
}

/// Graph payload for one schedulable leaf.
struct LeafNode<'a> {
    node: NodeId,
    depends_on: &'a [String],
    is_target: bool,
}

impl GraphNodeData for LeafNode<'_> {
    fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.depends_on.iter().map(String::as_str)
    }

    fn accepts_dependents(&self) -> bool {
        self.is_target
    }
}

/// Validate the plan's identifiers and dependencies and order its leaves.
///
/// Steps, each failing fast:
/// 1. index every node in document order ([`Error::DuplicateIdentifier`]);
/// 2. check every `depends_on` entry names a work package, or a milestone
///    when `allow_milestone_dependencies` is set ([`Error::UnknownDependency`]);
/// 3. look for cycles ([`Error::CyclicDependency`]).
///
/// # Errors
///
/// Returns the first violation found.
#[instrument(skip_all, fields(plan = %plan.name, nodes = plan.len()))]
pub fn resolve(plan: &Plan, config: &SchedulerConfig) -> Result<ResolvedPlan> {
    let index = index_nodes(plan)?;

    let mut graph = DependencyGraph::new();
    for (id, _) in plan.walk() {
        let node = plan.node(id);
        let is_target = match node.kind {
            NodeKind::WorkPackage(_) => true,
            NodeKind::Milestone(_) => config.allow_milestone_dependencies,
            NodeKind::Group(_) => continue,
        };
        graph
            .add_node(
                &node.id,
                LeafNode {
                    node: id,
                    depends_on: node.depends_on(),
                    is_target,
                },
            )
            .map_err(|e| graph_error(plan, &index, e))?;
    }

    graph
        .add_dependency_edges()
        .map_err(|e| graph_error(plan, &index, e))?;

    let order: Vec<NodeId> = graph
        .topological_nodes()
        .map_err(|e| graph_error(plan, &index, e))?
        .into_iter()
        .map(|n| n.data.node)
        .collect();

    debug!(
        schedulable = order.len(),
        edges = graph.edge_count(),
        "Resolved dependency order"
    );

    Ok(ResolvedPlan { order, index })
}

fn index_nodes(plan: &Plan) -> Result<HashMap<String, NodeId>> {
    let mut index: HashMap<String, NodeId> = HashMap::with_capacity(plan.len());

    for (id, _) in plan.walk() {
        let node = plan.node(id);
        if let Some(&first) = index.get(&node.id) {
            return Err(Error::DuplicateIdentifier {
                id: node.id.clone(),
                first: plan.location(first),
                second: plan.location(id),
            });
        }
        index.insert(node.id.clone(), id);
    }

    Ok(index)
}

fn graph_error(
    plan: &Plan,
    index: &HashMap<String, NodeId>,
    err: ganttgen_dep_graph::Error,
) -> Error {
    use ganttgen_dep_graph::Error as GraphError;

    match err {
        GraphError::MissingDependency { node, dependency } => {
            // Groups are in the index but not in the graph.
            match index.get(&dependency).map(|&id| plan.node(id).node_type()) {
                Some(found) => Error::ineligible_dependency(node, dependency, found),
                None => Error::unknown_dependency(node, dependency),
            }
        }
        GraphError::IneligibleDependency { node, dependency } => {
            let found = index
                .get(&dependency)
                .map_or(NodeType::Milestone, |&id| plan.node(id).node_type());
            Error::ineligible_dependency(node, dependency, found)
        }
        GraphError::CycleDetected { cycle } => Error::CyclicDependency { cycle },
        GraphError::DuplicateNode { name } => {
            Error::internal(format!("identifier '{name}' indexed twice"))
        }
        GraphError::TopologicalSortFailed { reason } => Error::internal(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Milestone, WorkPackage};
    use std::num::NonZeroU32;

    fn wp(days: u32) -> WorkPackage {
        WorkPackage::new(NonZeroU32::new(days).unwrap())
    }

    fn ids(plan: &Plan, resolved: &ResolvedPlan) -> Vec<String> {
        resolved
            .order()
            .iter()
            .map(|&id| plan.node(id).id.clone())
            .collect()
    }

    #[test]
    fn test_order_excludes_groups_and_follows_dependencies() {
        let mut plan = Plan::new("p");
        let cat = plan.add_group(None, "cat", "Cat");
        plan.add_work_package(Some(cat), "b", "B", wp(1).after(["a"]));
        plan.add_work_package(Some(cat), "a", "A", wp(1));
        plan.add_milestone(Some(cat), "m", "M", Milestone::default().after(["b"]));

        let resolved = resolve(&plan, &SchedulerConfig::default()).unwrap();
        assert_eq!(ids(&plan, &resolved), vec!["a", "b", "m"]);
        assert!(resolved.lookup("cat").is_some());
    }

    #[test]
    fn test_duplicate_across_categories() {
        let mut plan = Plan::new("p");
        let first = plan.add_group(None, "one", "One");
        let second = plan.add_group(None, "two", "Two");
        plan.add_work_package(Some(first), "dup", "A", wp(1));
        plan.add_milestone(Some(second), "dup", "B", Milestone::default());

        let err = resolve(&plan, &SchedulerConfig::default()).unwrap_err();
        match err {
            Error::DuplicateIdentifier { id, first, second } => {
                assert_eq!(id, "dup");
                assert_eq!(first, "one / dup");
                assert_eq!(second, "two / dup");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_group_and_leaf_ids_share_namespace() {
        let mut plan = Plan::new("p");
        let cat = plan.add_group(None, "x", "X");
        plan.add_work_package(Some(cat), "x", "Also X", wp(1));

        let err = resolve(&plan, &SchedulerConfig::default()).unwrap_err();
        assert!(matches!(err, Error::DuplicateIdentifier { .. }));
    }

    #[test]
    fn test_unknown_dependency() {
        let mut plan = Plan::new("p");
        plan.add_work_package(None, "a", "A", wp(1).after(["missing"]));

        let err = resolve(&plan, &SchedulerConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownDependency { ref from, ref target, found: None, .. }
                if from == "a" && target == "missing"
        ));
    }

    #[test]
    fn test_group_is_not_a_dependency_target() {
        let mut plan = Plan::new("p");
        let cat = plan.add_group(None, "cat", "Cat");
        plan.add_work_package(Some(cat), "a", "A", wp(1).after(["cat"]));

        let err = resolve(&plan, &SchedulerConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownDependency { found: Some(NodeType::Group), .. }
        ));
    }

    #[test]
    fn test_milestone_targets_are_configurable() {
        let mut plan = Plan::new("p");
        plan.add_milestone(None, "gate", "Gate", Milestone::default());
        plan.add_work_package(None, "a", "A", wp(1).after(["gate"]));

        let err = resolve(&plan, &SchedulerConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownDependency { found: Some(NodeType::Milestone), .. }
        ));

        let config = SchedulerConfig::default().with_milestone_dependencies(true);
        let resolved = resolve(&plan, &config).unwrap();
        assert_eq!(ids(&plan, &resolved), vec!["gate", "a"]);
    }

    #[test]
    fn test_unknown_reference_reported_before_cycle() {
        let mut plan = Plan::new("p");
        plan.add_work_package(None, "a", "A", wp(1).after(["b"]));
        plan.add_work_package(None, "b", "B", wp(1).after(["a"]));
        plan.add_work_package(None, "c", "C", wp(1).after(["nope"]));

        let err = resolve(&plan, &SchedulerConfig::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownDependency { .. }));
    }

    #[test]
    fn test_cycle_trace() {
        let mut plan = Plan::new("p");
        plan.add_work_package(None, "a", "A", wp(1).after(["b"]));
        plan.add_work_package(None, "b", "B", wp(1).after(["a"]));

        let err = resolve(&plan, &SchedulerConfig::default()).unwrap_err();
        match err {
            Error::CyclicDependency { cycle } => assert_eq!(cycle, vec!["a", "b", "a"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
