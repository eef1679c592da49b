//! Dependency graph algorithms for ganttgen plans.
//!
//! This crate holds the graph side of a project plan: every schedulable item
//! is a node, every `depends_on` entry an edge. It validates references,
//! finds cycles with an explicit trace, and produces a topological order
//! whose ties are broken by insertion order, so identical input always
//! yields identical output.
//!
//! # Key Types
//!
//! - [`DependencyGraph`]: builds and queries the graph
//! - [`GraphNodeData`]: trait node payloads implement to expose their dependencies
//! - [`GraphNode`]: a node in the graph holding its name and payload
//!
//! # Example
//!
//! ```ignore
//! use ganttgen_dep_graph::{DependencyGraph, GraphNodeData};
//!
//! struct Item {
//!     depends_on: Vec<String>,
//! }
//!
//! impl GraphNodeData for Item {
//!     fn dependency_names(&self) -> impl Iterator<Item = &str> {
//!         self.depends_on.iter().map(String::as_str)
//!     }
//! }
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node("design", Item { depends_on: vec![] })?;
//! graph.add_node("build", Item { depends_on: vec!["design".to_string()] })?;
//! graph.add_dependency_edges()?;
//!
//! let order = graph.topological_order()?;
//! ```

mod error;
mod graph;
mod traversal;

pub use error::{Error, Result};
pub use graph::{DependencyGraph, GraphNode};
pub use traversal::{TopologicalOrder, VisitState};

/// Trait for node payloads stored in a [`DependencyGraph`].
pub trait GraphNodeData {
    /// Names of the nodes this node depends on, in declaration order.
    fn dependency_names(&self) -> impl Iterator<Item = &str>;

    /// Whether other nodes may declare a dependency on this node.
    ///
    /// Defaults to `true`. Payloads that exist in the graph only for
    /// ordering (for example milestones when milestone targets are
    /// disabled) return `false`, which turns any reference to them into
    /// [`Error::IneligibleDependency`].
    fn accepts_dependents(&self) -> bool {
        true
    }
}
