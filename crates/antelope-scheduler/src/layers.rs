//! Groups a strict-edge DAG into dependency layers so a scheduler run can
//! process each layer with bounded concurrency while still guaranteeing a
//! module only transitions after every strict provider has (spec §4.5).

use antelope_core::ModuleId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};

/// `layers[0]` has no strict dependencies; `layers[k]`'s modules depend only
/// on modules in `layers[0..k]`.
#[must_use]
pub fn layer(graph: &DiGraph<ModuleId, ()>) -> Vec<Vec<ModuleId>> {
    let mut remaining: HashMap<NodeIndex, usize> = graph
        .node_indices()
        .map(|n| (n, graph.neighbors_directed(n, Direction::Incoming).count()))
        .collect();

    let mut layers = Vec::new();
    loop {
        let ready: BTreeSet<(ModuleId, NodeIndex)> = remaining
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(n, _)| (graph[*n].clone(), *n))
            .collect();
        if ready.is_empty() {
            break;
        }
        for (_, n) in &ready {
            remaining.remove(n);
        }
        for (_, n) in &ready {
            for succ in graph.neighbors_directed(*n, Direction::Outgoing) {
                if let Some(d) = remaining.get_mut(&succ) {
                    *d -= 1;
                }
            }
        }
        layers.push(ready.into_iter().map(|(id, _)| id).collect());
    }
    layers
}
