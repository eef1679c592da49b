//! Error types for dependency graph operations.

use thiserror::Error;

/// Result type for dependency graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or ordering a dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A node with the same name was already added.
    #[error("Node '{name}' is defined more than once")]
    DuplicateNode {
        /// The name that collided.
        name: String,
    },

    /// A node depends on a name that is not in the graph.
    #[error("Node '{node}' depends on missing node '{dependency}'")]
    MissingDependency {
        /// The node declaring the dependency.
        node: String,
        /// The name that could not be found.
        dependency: String,
    },

    /// A node depends on a node that does not accept dependents.
    #[error("Node '{node}' depends on '{dependency}', which cannot be a dependency target")]
    IneligibleDependency {
        /// The node declaring the dependency.
        node: String,
        /// The ineligible target.
        dependency: String,
    },

    /// A dependency cycle was detected.
    ///
    /// `cycle` starts and ends with the same name; each entry depends on the
    /// one after it.
    #[error("Cycle detected in dependency graph: {}", cycle.join(" -> "))]
    CycleDetected {
        /// Ordered trace of the cycle.
        cycle: Vec<String>,
    },

    /// Failed to perform the topological sort.
    #[error("Failed to order nodes topologically: {reason}")]
    TopologicalSortFailed {
        /// Reason for the failure.
        reason: String,
    },
}
