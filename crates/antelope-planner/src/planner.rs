//! `DependencyPlanner` (spec §4.4).

use crate::types::{Plan, ProviderOutcome};
use antelope_config::ResolvedModuleEntry;
use antelope_core::{Error, InterfaceRef, ModuleId, ModuleManifest, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::warn;

#[derive(Debug, Default)]
pub struct DependencyPlanner;

impl DependencyPlanner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build the provider map, strict-edge DAG, and scheduling order for a
    /// resolved module set.
    pub fn plan(
        &self,
        manifests: &[ModuleManifest],
        entries: &HashMap<ModuleId, ResolvedModuleEntry>,
    ) -> Result<Plan> {
        let exporters = index_exporters(manifests);

        let mut graph = DiGraph::<ModuleId, ()>::new();
        let mut nodes: HashMap<ModuleId, NodeIndex> = HashMap::new();
        for manifest in manifests {
            let idx = graph.add_node(manifest.id.clone());
            nodes.insert(manifest.id.clone(), idx);
        }

        let mut providers = HashMap::new();

        for manifest in manifests {
            let entry = entries.get(&manifest.id);
            let overrides: HashMap<&InterfaceRef, &antelope_config::ResolvedImportOverride> = entry
                .map(|e| e.import_overrides.iter().map(|o| (&o.interface, o)).collect())
                .unwrap_or_default();
            let disabled: HashSet<&str> = entry
                .map(|e| e.disabled_exports.iter().map(String::as_str).collect())
                .unwrap_or_default();

            for request in &manifest.imports {
                let outcome = resolve_one(request, false, &overrides, &exporters, &disabled);
                if let ProviderOutcome::Resolved { provider, .. } = &outcome {
                    if let (Some(&from), Some(&to)) = (nodes.get(provider), nodes.get(&manifest.id)) {
                        graph.add_edge(from, to, ());
                    }
                }
                providers.insert((manifest.id.clone(), request.clone()), outcome);
            }

            for request in &manifest.optional_imports {
                let outcome = resolve_one(request, true, &overrides, &exporters, &disabled);
                // Optional edges never order scheduling (spec §4.4).
                providers.insert((manifest.id.clone(), request.clone()), outcome);
            }
        }

        let order = match toposort_deterministic(&graph) {
            Ok(order) => order,
            Err(cycle) => return Err(Error::ImportCycle { cycle }),
        };

        Ok(Plan { providers, graph, order })
    }
}

fn resolve_one(
    request: &InterfaceRef,
    optional: bool,
    overrides: &HashMap<&InterfaceRef, &antelope_config::ResolvedImportOverride>,
    exporters: &HashMap<&str, Vec<(&ModuleId, &antelope_core::ExportDescriptor)>>,
    disabled: &HashSet<&str>,
) -> ProviderOutcome {
    if let Some(ov) = overrides.get(request) {
        let provider_exports_it = exporters
            .get(request.name.as_str())
            .into_iter()
            .flatten()
            .any(|(module, export)| {
                *module == &ov.provider_module_id
                    && match &ov.provider_export_id {
                        Some(export_id) => export.interface.as_key() == *export_id,
                        None => export.range.covers(&request.version),
                    }
            });

        return if provider_exports_it {
            ProviderOutcome::Resolved {
                provider: ov.provider_module_id.clone(),
                export_id: ov.provider_export_id.clone(),
            }
        } else {
            warn!(
                interface = %request,
                provider = %ov.provider_module_id,
                "importOverride points at a module that does not export the requested interface"
            );
            ProviderOutcome::Missing
        };
    }

    let candidates: Vec<&ModuleId> = exporters
        .get(request.name.as_str())
        .into_iter()
        .flatten()
        .filter(|(_, export)| export.range.covers(&request.version))
        .filter(|(_, export)| !disabled.contains(export.interface.as_key().as_str()))
        .map(|(module, _)| *module)
        .collect();

    match candidates.len() {
        0 => {
            if optional {
                ProviderOutcome::OptionalUnresolved
            } else {
                warn!(interface = %request, "no provider for strict import");
                ProviderOutcome::Missing
            }
        }
        1 => ProviderOutcome::Resolved {
            provider: candidates[0].clone(),
            export_id: None,
        },
        _ => ProviderOutcome::Ambiguous(candidates.into_iter().cloned().collect()),
    }
}

fn index_exporters(
    manifests: &[ModuleManifest],
) -> HashMap<&str, Vec<(&ModuleId, &antelope_core::ExportDescriptor)>> {
    let mut index: HashMap<&str, Vec<(&ModuleId, &antelope_core::ExportDescriptor)>> = HashMap::new();
    for manifest in manifests {
        for export in &manifest.exports {
            index
                .entry(export.interface.name.as_str())
                .or_default()
                .push((&manifest.id, export));
        }
    }
    index
}

/// Kahn's algorithm with the ready set ordered by `ModuleId` so tie-breaks
/// are deterministic (spec §4.4: "ties broken by ModuleId lexical
/// ordering").
fn toposort_deterministic(graph: &DiGraph<ModuleId, ()>) -> std::result::Result<Vec<ModuleId>, Vec<ModuleId>> {
    let mut in_degree: HashMap<NodeIndex, usize> = graph
        .node_indices()
        .map(|n| (n, graph.neighbors_directed(n, Direction::Incoming).count()))
        .collect();

    let mut ready: BTreeSet<(ModuleId, NodeIndex)> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(n, _)| (graph[*n].clone(), *n))
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some((id, n)) = ready.iter().next().cloned() {
        ready.remove(&(id.clone(), n));
        order.push(id);
        for succ in graph.neighbors_directed(n, Direction::Outgoing) {
            let degree = in_degree.get_mut(&succ).expect("node indexed");
            *degree -= 1;
            if *degree == 0 {
                ready.insert((graph[succ].clone(), succ));
            }
        }
    }

    if order.len() == graph.node_count() {
        Ok(order)
    } else {
        let remaining = in_degree
            .into_iter()
            .filter(|(_, deg)| *deg > 0)
            .map(|(n, _)| graph[n].clone())
            .collect();
        Err(remaining)
    }
}
