//! Output types of a planning run (spec §4.4).

use antelope_core::{InterfaceRef, ModuleId};
use petgraph::graph::DiGraph;
use std::collections::HashMap;

/// The outcome of resolving one `(consumer, interface)` import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// Exactly one matching, non-disabled exporter was found (or an
    /// `importOverride` pinned one directly).
    Resolved {
        provider: ModuleId,
        export_id: Option<String>,
    },
    /// No provider exists, but the import was declared optional.
    OptionalUnresolved,
    /// No provider exists and the import was strict.
    Missing,
    /// More than one module exports a matching, non-disabled descriptor.
    Ambiguous(Vec<ModuleId>),
}

impl ProviderOutcome {
    #[must_use]
    pub const fn is_problem(&self) -> bool {
        !matches!(self, Self::Resolved { .. } | Self::OptionalUnresolved)
    }
}

/// The full result of a planning run: the effective provider map, the
/// strict-edge DAG, and a deterministic scheduling order.
#[derive(Debug)]
pub struct Plan {
    pub providers: HashMap<(ModuleId, InterfaceRef), ProviderOutcome>,
    pub graph: DiGraph<ModuleId, ()>,
    /// Topological order of the strict-edge DAG (dependencies before
    /// dependents), ties broken by `ModuleId` lexical order.
    pub order: Vec<ModuleId>,
}

impl Plan {
    /// Every `(consumer, interface)` resolution that is not cleanly
    /// resolved or optionally-unresolved: missing imports and ambiguities.
    pub fn diagnostics(&self) -> impl Iterator<Item = (&(ModuleId, InterfaceRef), &ProviderOutcome)> {
        self.providers.iter().filter(|(_, outcome)| outcome.is_problem())
    }

    #[must_use]
    pub fn provider_of(&self, consumer: &ModuleId, interface: &InterfaceRef) -> Option<&ProviderOutcome> {
        self.providers.get(&(consumer.clone(), interface.clone()))
    }
}
