//! Traversal types for dependency graphs.

use petgraph::graph::NodeIndex;

/// Node indices in an order where every dependency precedes its dependents.
pub type TopologicalOrder = Vec<NodeIndex>;

/// Per-node state of the depth-first cycle search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitState {
    /// Not reached yet.
    #[default]
    Unvisited,
    /// On the current DFS path. Reaching such a node again closes a cycle.
    InProgress,
    /// Fully explored; no cycle runs through it.
    Done,
}

/// One level of the explicit DFS stack.
pub(crate) struct Frame {
    pub(crate) node: NodeIndex,
    pub(crate) dependencies: Vec<NodeIndex>,
    pub(crate) next: usize,
}

impl Frame {
    pub(crate) fn new(node: NodeIndex, dependencies: Vec<NodeIndex>) -> Self {
        Self {
            node,
            dependencies,
            next: 0,
        }
    }
}
