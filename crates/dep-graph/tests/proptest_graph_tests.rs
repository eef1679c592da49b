//! Property-based tests for dependency graph invariants.
//!
//! These tests verify the behavioral contracts of the dependency graph:
//! - Topological order respects all dependencies
//! - Ties are broken by insertion order
//! - Cycle traces are closed walks along real dependency edges

use ganttgen_dep_graph::{DependencyGraph, Error, GraphNodeData};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

// =============================================================================
// Test Node Type
// =============================================================================

#[derive(Clone, Debug)]
struct PropNode {
    deps: Vec<String>,
}

impl GraphNodeData for PropNode {
    fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.deps.iter().map(String::as_str)
    }
}

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Generate a node name (lowercase alphanumeric with underscores).
fn node_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,10}".prop_map(String::from)
}

/// Make names unique by suffixing their position.
fn unique(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| format!("{name}_{i}"))
        .collect()
}

/// Generate a DAG where every node only depends on nodes generated before it.
///
/// The nodes are then shuffled so the insertion order does not already
/// match a topological order.
fn dag_strategy(
    min_nodes: usize,
    max_nodes: usize,
) -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    (min_nodes..=max_nodes).prop_flat_map(|count| {
        proptest::collection::vec(node_name_strategy(), count).prop_flat_map(move |names| {
            let names = unique(names);

            let dep_strategies: Vec<_> = (0..count)
                .map(|i| {
                    if i == 0 {
                        Just(vec![]).boxed()
                    } else {
                        let earlier: Vec<String> = names[..i].to_vec();
                        proptest::collection::vec(proptest::sample::select(earlier), 0..=i.min(3))
                            .prop_map(|mut deps| {
                                let mut seen = HashSet::new();
                                deps.retain(|d| seen.insert(d.clone()));
                                deps
                            })
                            .boxed()
                    }
                })
                .collect();

            let names_clone = names.clone();
            dep_strategies
                .prop_map(move |all_deps| {
                    names_clone
                        .iter()
                        .cloned()
                        .zip(all_deps)
                        .collect::<Vec<_>>()
                })
                .prop_shuffle()
        })
    })
}

/// Generate a graph containing a ring of length >= 2, plus acyclic extras.
fn cyclic_graph_strategy() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    (2..=6_usize, 0..=4_usize).prop_flat_map(|(ring, extra)| {
        proptest::collection::vec(node_name_strategy(), ring + extra).prop_map(move |names| {
            let names = unique(names);
            let mut nodes: Vec<(String, Vec<String>)> = Vec::new();

            for i in 0..ring {
                // Each ring member depends on the previous one; the first
                // closes the ring by depending on the last.
                let dep = if i == 0 { ring - 1 } else { i - 1 };
                nodes.push((names[i].clone(), vec![names[dep].clone()]));
            }
            for i in ring..ring + extra {
                nodes.push((names[i].clone(), vec![names[i - 1].clone()]));
            }

            nodes
        })
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

fn build_graph(nodes: &[(String, Vec<String>)]) -> Result<DependencyGraph<PropNode>, Error> {
    let mut graph = DependencyGraph::new();

    for (name, deps) in nodes {
        graph.add_node(name, PropNode { deps: deps.clone() })?;
    }

    graph.add_dependency_edges()?;
    Ok(graph)
}

fn ordered_names(graph: &DependencyGraph<PropNode>) -> Vec<String> {
    graph
        .topological_nodes()
        .expect("Order should succeed for DAG")
        .into_iter()
        .map(|n| n.name.clone())
        .collect()
}

// =============================================================================
// Property Tests: Topological Order
// =============================================================================

proptest! {
    /// Contract: every dependency appears before its dependent.
    #[test]
    fn topological_order_respects_dependencies(nodes in dag_strategy(1, 15)) {
        let graph = build_graph(&nodes).expect("Graph should build successfully");
        prop_assert!(graph.find_cycle().is_none());

        let positions: HashMap<String, usize> = ordered_names(&graph)
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();

        prop_assert_eq!(positions.len(), nodes.len());

        for (name, deps) in &nodes {
            let node_pos = positions[name];
            for dep in deps {
                prop_assert!(
                    positions[dep] < node_pos,
                    "Dependency '{}' should come before '{}'",
                    dep, name
                );
            }
        }
    }

    /// Contract: the order is a pure function of the input.
    #[test]
    fn topological_order_is_deterministic(nodes in dag_strategy(2, 12)) {
        let first = build_graph(&nodes).expect("Graph 1 should build");
        let second = build_graph(&nodes).expect("Graph 2 should build");

        prop_assert_eq!(ordered_names(&first), ordered_names(&second));
    }

    /// Contract: without edges the order is the insertion order.
    #[test]
    fn independent_nodes_keep_insertion_order(
        names in proptest::collection::vec(node_name_strategy(), 1..12)
    ) {
        let nodes: Vec<(String, Vec<String>)> =
            unique(names).into_iter().map(|n| (n, vec![])).collect();
        let graph = build_graph(&nodes).expect("Graph should build");

        let expected: Vec<String> = nodes.iter().map(|(n, _)| n.clone()).collect();
        prop_assert_eq!(ordered_names(&graph), expected);
    }

    /// Contract: the trace-based search agrees with petgraph's cycle check on DAGs.
    #[test]
    fn cycle_search_agrees_with_petgraph_on_dags(nodes in dag_strategy(1, 15)) {
        let graph = build_graph(&nodes).expect("Graph should build");
        prop_assert_eq!(graph.find_cycle().is_some(), graph.has_cycles());
    }
}

// =============================================================================
// Property Tests: Cycle Detection
// =============================================================================

proptest! {
    /// Contract: a cycle trace returns to its start and follows real edges.
    #[test]
    fn cycle_trace_is_a_closed_walk(nodes in cyclic_graph_strategy()) {
        let graph = build_graph(&nodes).expect("Graph should build");
        prop_assert!(graph.has_cycles());

        let cycle = graph.find_cycle().expect("Cycle should be found");
        prop_assert!(cycle.len() >= 2);
        prop_assert_eq!(cycle.first(), cycle.last());

        let deps: HashMap<&str, &Vec<String>> = nodes
            .iter()
            .map(|(name, deps)| (name.as_str(), deps))
            .collect();
        for pair in cycle.windows(2) {
            prop_assert!(
                deps[pair[0].as_str()].contains(&pair[1]),
                "'{}' should depend on '{}'",
                pair[0], pair[1]
            );
        }
    }

    /// Contract: ordering a cyclic graph fails with the trace.
    #[test]
    fn topological_order_fails_on_cycles(nodes in cyclic_graph_strategy()) {
        let graph = build_graph(&nodes).expect("Graph should build");
        let result = graph.topological_order();
        prop_assert!(
            matches!(result, Err(Error::CycleDetected { .. })),
            "expected a cycle error"
        );
    }
}
