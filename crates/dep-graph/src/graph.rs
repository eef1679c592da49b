//! Dependency graph builder using petgraph.
//!
//! Nodes are added in document order. Edges point from a dependency to its
//! dependent, so a topological order of the petgraph graph is a valid
//! processing order for the scheduler.

use crate::traversal::Frame;
use crate::{Error, GraphNodeData, Result, TopologicalOrder, VisitState};
use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::IntoNodeReferences;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use tracing::debug;

/// A node in the dependency graph.
#[derive(Debug, Clone)]
pub struct GraphNode<T> {
    /// Identifier of the node.
    pub name: String,
    /// The node payload.
    pub data: T,
}

/// Dependency graph over named nodes.
pub struct DependencyGraph<T: GraphNodeData> {
    /// Edges run dependency -> dependent.
    graph: DiGraph<GraphNode<T>, ()>,
    name_to_node: HashMap<String, NodeIndex>,
}

impl<T: GraphNodeData> DependencyGraph<T> {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            name_to_node: HashMap::new(),
        }
    }

    /// Add a node to the graph.
    ///
    /// Insertion order is significant: it is the tie-break used by
    /// [`Self::topological_order`] and the root order of [`Self::find_cycle`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateNode`] if the name is already present.
    pub fn add_node(&mut self, name: &str, data: T) -> Result<NodeIndex> {
        if self.name_to_node.contains_key(name) {
            return Err(Error::DuplicateNode {
                name: name.to_string(),
            });
        }

        let index = self.graph.add_node(GraphNode {
            name: name.to_string(),
            data,
        });
        self.name_to_node.insert(name.to_string(), index);
        debug!(node = name, index = index.index(), "Added graph node");

        Ok(index)
    }

    /// Get a node by index.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> Option<&GraphNode<T>> {
        self.graph.node_weight(index)
    }

    /// Get the node index for a name.
    #[must_use]
    pub fn get_node_index(&self, name: &str) -> Option<NodeIndex> {
        self.name_to_node.get(name).copied()
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependency edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Add dependency edges after all nodes have been added.
    ///
    /// Nodes are checked in insertion order and their dependencies in
    /// declaration order; the first bad reference is reported.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDependency`] for a name that is not in the
    /// graph and [`Error::IneligibleDependency`] for a target whose payload
    /// does not accept dependents.
    pub fn add_dependency_edges(&mut self) -> Result<()> {
        let mut edges_to_add = Vec::new();

        for (node_index, node) in self.graph.node_references() {
            for dep_name in node.data.dependency_names() {
                let Some(&dep_index) = self.name_to_node.get(dep_name) else {
                    return Err(Error::MissingDependency {
                        node: node.name.clone(),
                        dependency: dep_name.to_string(),
                    });
                };
                if !self.graph[dep_index].data.accepts_dependents() {
                    return Err(Error::IneligibleDependency {
                        node: node.name.clone(),
                        dependency: dep_name.to_string(),
                    });
                }
                edges_to_add.push((dep_index, node_index));
            }
        }

        debug!(edges = edges_to_add.len(), "Adding dependency edges");
        for (from, to) in edges_to_add {
            self.graph.add_edge(from, to, ());
        }

        Ok(())
    }

    /// Check if the graph has cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Indices of the nodes `index` depends on, in declaration order.
    ///
    /// Names that are not in the graph are skipped; call
    /// [`Self::add_dependency_edges`] first to reject them.
    #[must_use]
    pub fn dependencies_of(&self, index: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .node_weight(index)
            .map(|node| {
                node.data
                    .dependency_names()
                    .filter_map(|name| self.name_to_node.get(name).copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Search for a dependency cycle.
    ///
    /// Runs an iterative depth-first search along `depends_on` references,
    /// tracking a [`VisitState`] per node and a parent pointer for every node
    /// reached. Roots are tried in insertion order. When the search reaches a
    /// node that is still [`VisitState::InProgress`], the parent chain from
    /// the current node back to that node is the cycle.
    ///
    /// The returned trace starts and ends with the same name and each entry
    /// depends on the next one. A self-dependency yields `[a, a]`.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let count = self.graph.node_count();
        let mut state = vec![VisitState::Unvisited; count];
        let mut parent: Vec<Option<NodeIndex>> = vec![None; count];

        for root in self.graph.node_indices() {
            if state[root.index()] != VisitState::Unvisited {
                continue;
            }

            state[root.index()] = VisitState::InProgress;
            let mut stack = vec![Frame::new(root, self.dependencies_of(root))];

            while let Some(frame) = stack.last_mut() {
                let node = frame.node;
                let Some(&dep) = frame.dependencies.get(frame.next) else {
                    state[node.index()] = VisitState::Done;
                    stack.pop();
                    continue;
                };
                frame.next += 1;

                match state[dep.index()] {
                    VisitState::Unvisited => {
                        parent[dep.index()] = Some(node);
                        state[dep.index()] = VisitState::InProgress;
                        stack.push(Frame::new(dep, self.dependencies_of(dep)));
                    }
                    VisitState::InProgress => {
                        let cycle = self.trace_cycle(&parent, node, dep);
                        debug!(cycle = ?cycle, "Dependency cycle found");
                        return Some(cycle);
                    }
                    VisitState::Done => {}
                }
            }
        }

        None
    }

    /// Rebuild the cycle closed by the back edge `from -> to`.
    fn trace_cycle(
        &self,
        parent: &[Option<NodeIndex>],
        from: NodeIndex,
        to: NodeIndex,
    ) -> Vec<String> {
        let mut path = vec![from];
        let mut current = from;
        while current != to {
            match parent[current.index()] {
                Some(p) => {
                    path.push(p);
                    current = p;
                }
                None => break,
            }
        }
        path.reverse();
        path.push(to);

        path.into_iter()
            .map(|idx| self.graph[idx].name.clone())
            .collect()
    }

    /// Compute a deterministic topological order.
    ///
    /// Kahn's algorithm with a min-heap of ready nodes keyed by insertion
    /// index: whenever several nodes are ready, the one added first goes
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] with the cycle trace if the graph is
    /// cyclic.
    pub fn topological_order(&self) -> Result<TopologicalOrder> {
        if let Some(cycle) = self.find_cycle() {
            return Err(Error::CycleDetected { cycle });
        }

        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count()
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|idx| in_degree[idx.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(index)) = ready.pop() {
            order.push(index);
            for dependent in self.graph.neighbors_directed(index, Direction::Outgoing) {
                let degree = &mut in_degree[dependent.index()];
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if order.len() != self.graph.node_count() {
            return Err(Error::TopologicalSortFailed {
                reason: format!(
                    "ordered {} of {} nodes",
                    order.len(),
                    self.graph.node_count()
                ),
            });
        }

        Ok(order)
    }

    /// Topological order resolved to nodes.
    ///
    /// # Errors
    ///
    /// Same as [`Self::topological_order`].
    pub fn topological_nodes(&self) -> Result<Vec<&GraphNode<T>>> {
        Ok(self
            .topological_order()?
            .into_iter()
            .map(|idx| &self.graph[idx])
            .collect())
    }
}

impl<T: GraphNodeData> Default for DependencyGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, Default)]
    struct TestNode {
        depends_on: Vec<String>,
        sealed: bool,
    }

    impl TestNode {
        fn new(deps: &[&str]) -> Self {
            Self {
                depends_on: deps.iter().map(|s| (*s).to_string()).collect(),
                sealed: false,
            }
        }

        fn sealed() -> Self {
            Self {
                depends_on: vec![],
                sealed: true,
            }
        }
    }

    impl GraphNodeData for TestNode {
        fn dependency_names(&self) -> impl Iterator<Item = &str> {
            self.depends_on.iter().map(String::as_str)
        }

        fn accepts_dependents(&self) -> bool {
            !self.sealed
        }
    }

    fn build(nodes: &[(&str, &[&str])]) -> DependencyGraph<TestNode> {
        let mut graph = DependencyGraph::new();
        for (name, deps) in nodes {
            graph.add_node(name, TestNode::new(deps)).unwrap();
        }
        graph.add_dependency_edges().unwrap();
        graph
    }

    fn names(graph: &DependencyGraph<TestNode>) -> Vec<String> {
        graph
            .topological_nodes()
            .unwrap()
            .into_iter()
            .map(|n| n.name.clone())
            .collect()
    }

    #[test]
    fn test_new_graph_is_empty() {
        let graph: DependencyGraph<TestNode> = DependencyGraph::new();
        assert_eq!(graph.node_count(), 0);
        assert!(graph.topological_order().unwrap().is_empty());
        assert!(graph.find_cycle().is_none());
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut graph = DependencyGraph::new();
        graph.add_node("a", TestNode::new(&[])).unwrap();
        let err = graph.add_node("a", TestNode::new(&[])).unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateNode {
                name: "a".to_string()
            }
        );
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_missing_dependency_reports_first_in_order() {
        let mut graph = DependencyGraph::new();
        graph.add_node("a", TestNode::new(&["ghost"])).unwrap();
        graph.add_node("b", TestNode::new(&["phantom"])).unwrap();

        let err = graph.add_dependency_edges().unwrap_err();
        assert_eq!(
            err,
            Error::MissingDependency {
                node: "a".to_string(),
                dependency: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_ineligible_dependency_rejected() {
        let mut graph = DependencyGraph::new();
        graph.add_node("gate", TestNode::sealed()).unwrap();
        graph.add_node("work", TestNode::new(&["gate"])).unwrap();

        let err = graph.add_dependency_edges().unwrap_err();
        let Error::IneligibleDependency { dependency, .. } = &err else {
            panic!("expected an ineligible dependency, got {err:?}");
        };
        assert_eq!(dependency, "gate");
    }

    #[test]
    fn test_topological_order_respects_dependencies() {
        let graph = build(&[
            ("task3", &["task1", "task2"]),
            ("task2", &["task1"]),
            ("task1", &[]),
        ]);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(names(&graph), vec!["task1", "task2", "task3"]);
    }

    #[test]
    fn test_ties_broken_by_insertion_order() {
        let graph = build(&[("c", &[]), ("a", &[]), ("b", &[]), ("d", &["a"])]);
        assert_eq!(names(&graph), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_dependent_waits_for_late_dependency() {
        // "early" is ready first but depends on the last inserted node.
        let graph = build(&[("early", &["late"]), ("middle", &[]), ("late", &[])]);
        assert_eq!(names(&graph), vec!["middle", "late", "early"]);
    }

    #[test]
    fn test_cycle_trace_is_closed() {
        // task1 -> task3 -> task2 -> task1 along depends_on
        let graph = build(&[
            ("task1", &["task3"]),
            ("task2", &["task1"]),
            ("task3", &["task2"]),
        ]);

        assert!(graph.has_cycles());
        let cycle = graph.find_cycle().unwrap();
        assert_eq!(cycle, vec!["task1", "task3", "task2", "task1"]);

        let err = graph.topological_order().unwrap_err();
        assert!(matches!(err, Error::CycleDetected { cycle: ref c } if c == &cycle));
    }

    #[test]
    fn test_cycle_trace_excludes_tail_leading_into_cycle() {
        let graph = build(&[
            ("entry", &["x"]),
            ("x", &["y"]),
            ("y", &["z"]),
            ("z", &["x"]),
        ]);
        assert_eq!(graph.find_cycle().unwrap(), vec!["x", "y", "z", "x"]);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let graph = build(&[("loop", &["loop"])]);
        assert_eq!(graph.find_cycle().unwrap(), vec!["loop", "loop"]);
    }

    #[test]
    fn test_diamond_has_no_cycle() {
        let graph = build(&[
            ("root", &[]),
            ("left", &["root"]),
            ("right", &["root"]),
            ("join", &["left", "right"]),
        ]);
        assert!(graph.find_cycle().is_none());
        assert_eq!(names(&graph), vec!["root", "left", "right", "join"]);
    }

    #[test]
    fn test_dependencies_of_keeps_declaration_order() {
        let graph = build(&[("a", &[]), ("b", &[]), ("c", &["b", "a"])]);
        let c = graph.get_node_index("c").unwrap();
        let deps: Vec<_> = graph
            .dependencies_of(c)
            .into_iter()
            .map(|i| graph.node(i).unwrap().name.clone())
            .collect();
        assert_eq!(deps, vec!["b", "a"]);
    }
}
