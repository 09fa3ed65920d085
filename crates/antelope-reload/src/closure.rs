//! The strict-consumer closure of a changed module (spec §4.9 step 1).

use antelope_core::ModuleId;
use antelope_planner::Plan;
use petgraph::graph::DiGraph;
use petgraph::visit::Bfs;
use std::collections::{HashMap, HashSet};

/// `root` plus every module reachable by following strict provider ->
/// consumer edges forward from it, i.e. everything that would observe a
/// stale state if `root` were reloaded in place.
#[must_use]
pub fn strict_consumer_closure(graph: &DiGraph<ModuleId, ()>, root: &ModuleId) -> HashSet<ModuleId> {
    let mut closure = HashSet::new();
    let Some(start) = graph.node_indices().find(|n| graph[*n] == *root) else {
        closure.insert(root.clone());
        return closure;
    };

    let mut bfs = Bfs::new(graph, start);
    while let Some(node) = bfs.next(graph) {
        closure.insert(graph[node].clone());
    }
    closure
}

/// The subgraph of `graph` induced by `closure`, wrapped as a `Plan` so it
/// can be handed straight to `LifecycleScheduler`. `providers` and `order`
/// are left empty: the scheduler only reads `graph`.
#[must_use]
pub fn induced_plan(graph: &DiGraph<ModuleId, ()>, closure: &HashSet<ModuleId>) -> Plan {
    let mut sub = DiGraph::<ModuleId, ()>::new();
    let mut nodes = HashMap::new();
    for id in closure {
        nodes.insert(id.clone(), sub.add_node(id.clone()));
    }
    for edge in graph.edge_indices() {
        let (from, to) = graph.edge_endpoints(edge).expect("edge index valid");
        let (from_id, to_id) = (&graph[from], &graph[to]);
        if let (Some(&a), Some(&b)) = (nodes.get(from_id), nodes.get(to_id)) {
            sub.add_edge(a, b, ());
        }
    }
    Plan {
        providers: HashMap::new(),
        graph: sub,
        order: closure.iter().cloned().collect(),
    }
}
