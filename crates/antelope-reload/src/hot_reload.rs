//! `HotReload` (spec §4.9): orchestrates a debounced, cancellable
//! stop/destroy/reload/construct/start cycle over a changed module's
//! strict-consumer closure.

use crate::closure::{induced_plan, strict_consumer_closure};
use crate::debounce::next_batch;
use crate::reloader::ManifestReloader;
use antelope_config::ResolvedModuleEntry;
use antelope_core::{ModuleId, ModuleManifest, RwLock};
use antelope_loader::{PathResolver, ProxyTracker};
use antelope_planner::{DependencyPlanner, Plan};
use antelope_scheduler::LifecycleScheduler;
use antelope_watch::ModuleChanged;
use dashmap::DashMap;
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct HotReload {
    scheduler: Arc<LifecycleScheduler>,
    path_resolver: Arc<PathResolver>,
    proxies: Arc<ProxyTracker>,
    reloader: Arc<dyn ManifestReloader>,
    debounce_window: Duration,
    cancel: CancellationToken,
}

impl std::fmt::Debug for HotReload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotReload").field("debounce_window", &self.debounce_window).finish()
    }
}

impl HotReload {
    #[must_use]
    pub fn new(
        scheduler: Arc<LifecycleScheduler>,
        path_resolver: Arc<PathResolver>,
        proxies: Arc<ProxyTracker>,
        reloader: Arc<dyn ManifestReloader>,
        debounce_window: Duration,
    ) -> Self {
        Self {
            scheduler,
            path_resolver,
            proxies,
            reloader,
            debounce_window,
            cancel: CancellationToken::new(),
        }
    }

    /// A clone of this `HotReload`'s cancellation token; cancel it (e.g. on
    /// shutdown) to drain queued reloads and stop after the current
    /// in-flight transition reaches its next await point.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Consumes `ModuleChanged` events until the channel closes or
    /// `cancel_token()` is cancelled.
    pub async fn run(
        &self,
        mut changes: UnboundedReceiver<ModuleChanged>,
        manifests: Arc<DashMap<ModuleId, ModuleManifest>>,
        plan: Arc<RwLock<Plan>>,
        entries: Arc<HashMap<ModuleId, ResolvedModuleEntry>>,
        configs: Arc<DashMap<ModuleId, Value>>,
    ) {
        loop {
            let batch = tokio::select! {
                () = self.cancel.cancelled() => return,
                batch = next_batch(&mut changes, self.debounce_window) => batch,
            };
            let Some(batch) = batch else { return };

            for root in batch {
                if self.cancel.is_cancelled() {
                    return;
                }
                self.reload_one(&root, &manifests, &plan, &entries, &configs).await;
            }
        }
    }

    async fn reload_one(
        &self,
        root: &ModuleId,
        manifests: &DashMap<ModuleId, ModuleManifest>,
        plan: &RwLock<Plan>,
        entries: &HashMap<ModuleId, ResolvedModuleEntry>,
        configs: &DashMap<ModuleId, Value>,
    ) {
        let closure = strict_consumer_closure(&plan.read().graph, root);
        let teardown_plan = induced_plan(&plan.read().graph, &closure);

        self.scheduler.stop_all(&teardown_plan).await;
        self.scheduler.destroy_all(&teardown_plan).await;
        for id in &closure {
            self.path_resolver.unregister_module(id);
            self.proxies.clear(id);
        }

        let fresh = match self.reloader.reload(root).await {
            Ok(fresh) => fresh,
            Err(e) => {
                error!(module = %root, error = %e, "hot reload failed to re-fetch manifest, closure left stopped");
                return;
            }
        };
        if let Some(mut entry) = manifests.get_mut(root) {
            entry.reload_from(fresh);
        }

        let closure_manifests: Vec<ModuleManifest> =
            closure.iter().filter_map(|id| manifests.get(id).map(|e| e.clone())).collect();

        let sub_plan = match DependencyPlanner::new().plan(&closure_manifests, entries) {
            Ok(p) => p,
            Err(e) => {
                error!(module = %root, error = %e, "re-planning the reload closure failed, closure left stopped");
                return;
            }
        };

        let closure_configs: HashMap<ModuleId, Value> = closure
            .iter()
            .filter_map(|id| configs.get(id).map(|c| (id.clone(), c.clone())))
            .collect();

        self.scheduler.construct_all(&sub_plan, &closure_configs).await;
        self.scheduler.start_all(&sub_plan).await;

        let mut guard = plan.write();
        merge_closure(&mut guard, sub_plan, &closure);
        drop(guard);
        info!(module = %root, affected = closure.len(), "hot reload complete");
    }
}

/// Replaces the closure's edges and provider outcomes in the project-wide
/// plan with the freshly recomputed sub-plan, leaving everything outside
/// the closure untouched.
fn merge_closure(into: &mut Plan, sub: Plan, closure: &std::collections::HashSet<ModuleId>) {
    for (key, outcome) in sub.providers {
        into.providers.insert(key, outcome);
    }

    let mut rebuilt = DiGraph::<ModuleId, ()>::new();
    let mut nodes: HashMap<ModuleId, NodeIndex> = HashMap::new();
    for idx in into.graph.node_indices() {
        let id = into.graph[idx].clone();
        nodes.entry(id.clone()).or_insert_with(|| rebuilt.add_node(id));
    }
    for id in closure {
        nodes.entry(id.clone()).or_insert_with(|| rebuilt.add_node(id.clone()));
    }

    for edge in into.graph.edge_indices() {
        let (from, to) = into.graph.edge_endpoints(edge).expect("edge index valid");
        let (from_id, to_id) = (into.graph[from].clone(), into.graph[to].clone());
        if closure.contains(&from_id) && closure.contains(&to_id) {
            continue; // superseded by the fresh sub-plan's edges below.
        }
        rebuilt.add_edge(nodes[&from_id], nodes[&to_id], ());
    }
    for edge in sub.graph.edge_indices() {
        let (from, to) = sub.graph.edge_endpoints(edge).expect("edge index valid");
        let (from_id, to_id) = (sub.graph[from].clone(), sub.graph[to].clone());
        rebuilt.add_edge(nodes[&from_id], nodes[&to_id], ());
    }
    into.graph = rebuilt;
}

#[cfg(test)]
mod tests {
    use super::*;
    use antelope_core::{ExportDescriptor, ModuleSource, VersionSpec};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc::unbounded_channel;

    fn manifest(id: &str) -> ModuleManifest {
        ModuleManifest {
            id: ModuleId::new(id),
            name: id.to_string(),
            version: semver::Version::new(1, 0, 0),
            folder: PathBuf::from(format!("/m/{id}")),
            main_entry: PathBuf::from("index.js"),
            exports_path: PathBuf::from(".exports"),
            exports: vec![ExportDescriptor {
                interface: antelope_core::InterfaceRef::new(id, "1"),
                range: VersionSpec::new("^1"),
            }],
            imports: Vec::new(),
            optional_imports: Vec::new(),
            src_aliases: Vec::new(),
            watch_dir: None,
            source: ModuleSource::Local { path: PathBuf::from(format!("/m/{id}")), watch_dir: None },
        }
    }

    struct NoopHooks;
    #[async_trait]
    impl antelope_scheduler::ModuleHooks for NoopHooks {
        async fn construct(&self, _id: &ModuleId, _config: &Value) -> antelope_core::Result<()> {
            Ok(())
        }
        async fn start(&self, _id: &ModuleId) -> antelope_core::Result<()> {
            Ok(())
        }
        async fn stop(&self, _id: &ModuleId) -> antelope_core::Result<()> {
            Ok(())
        }
        async fn destroy(&self, _id: &ModuleId) -> antelope_core::Result<()> {
            Ok(())
        }
    }

    struct CountingReloader {
        calls: AtomicUsize,
    }
    #[async_trait]
    impl ManifestReloader for CountingReloader {
        async fn reload(&self, id: &ModuleId) -> antelope_core::Result<ModuleManifest> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(manifest(id.as_str()))
        }
    }

    #[tokio::test]
    async fn reload_cycle_reconstructs_the_closure() {
        let manifests = Arc::new(DashMap::new());
        manifests.insert(ModuleId::new("a"), manifest("a"));
        manifests.insert(ModuleId::new("b"), manifest("b"));

        let mut graph = DiGraph::<ModuleId, ()>::new();
        let na = graph.add_node(ModuleId::new("a"));
        let nb = graph.add_node(ModuleId::new("b"));
        graph.add_edge(na, nb, ());
        let plan = Arc::new(RwLock::new(Plan { providers: HashMap::new(), graph, order: Vec::new() }));

        let scheduler = Arc::new(LifecycleScheduler::new(Arc::new(NoopHooks), None));
        let resolver = Arc::new(PathResolver::new(None));
        let proxies = Arc::new(ProxyTracker::new());
        let reloader = Arc::new(CountingReloader { calls: AtomicUsize::new(0) });

        let hot_reload = HotReload::new(scheduler, resolver, proxies, reloader.clone(), Duration::from_millis(10));

        let (tx, rx) = unbounded_channel();
        tx.send(ModuleChanged(ModuleId::new("a"))).unwrap();
        drop(tx);

        hot_reload
            .run(rx, manifests, plan.clone(), Arc::new(HashMap::new()), Arc::new(DashMap::new()))
            .await;

        assert_eq!(reloader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(plan.read().graph.edge_count(), 1);
    }

    #[tokio::test]
    async fn cancelling_stops_the_run_loop() {
        let manifests: Arc<DashMap<ModuleId, ModuleManifest>> = Arc::new(DashMap::new());
        let plan = Arc::new(RwLock::new(Plan { providers: HashMap::new(), graph: DiGraph::new(), order: Vec::new() }));
        let scheduler = Arc::new(LifecycleScheduler::new(Arc::new(NoopHooks), None));
        let resolver = Arc::new(PathResolver::new(None));
        let proxies = Arc::new(ProxyTracker::new());
        let reloader = Arc::new(CountingReloader { calls: AtomicUsize::new(0) });
        let hot_reload = HotReload::new(scheduler, resolver, proxies, reloader, Duration::from_secs(5));

        let (_tx, rx) = unbounded_channel::<ModuleChanged>();
        hot_reload.cancel_token().cancel();

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            hot_reload.run(rx, manifests, plan, Arc::new(HashMap::new()), Arc::new(DashMap::new())),
        )
        .await;
        assert!(result.is_ok());
    }
}
