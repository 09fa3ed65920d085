//! `ModuleManager` (spec §6): the handle `launch`/`launchFromBuild` return,
//! driving every tracked module through its lifecycle as one project-wide
//! unit.

use crate::handle::ModuleHandle;
use antelope_cache::ModuleCache;
use antelope_core::{DashMap, ModuleId, ModuleManifest, RwLock};
use antelope_loader::{PathResolver, ProxyTracker};
use antelope_planner::Plan;
use antelope_platform::DirLock;
use antelope_scheduler::LifecycleScheduler;
use antelope_watch::WatchEngine;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Everything a running project needs kept alive for its lifetime: the
/// scheduler and its collaborators, plus (when watching) the background
/// hot-reload task and the watcher it drains events from.
pub struct ModuleManager {
    pub(crate) scheduler: Arc<LifecycleScheduler>,
    pub(crate) path_resolver: Arc<PathResolver>,
    pub(crate) proxies: Arc<ProxyTracker>,
    pub(crate) manifests: Arc<DashMap<ModuleId, ModuleManifest>>,
    pub(crate) plan: Arc<RwLock<Plan>>,
    pub(crate) configs: Arc<DashMap<ModuleId, Value>>,
    pub(crate) cache: Arc<ModuleCache>,
    /// Held for this manager's entire lifetime (spec §5: "single-writer by
    /// convention"); dropping the manager releases the cache directory.
    pub(crate) cache_lock: DirLock,
    pub(crate) watch: Option<Arc<WatchEngine>>,
    pub(crate) reload_cancel: Option<CancellationToken>,
    pub(crate) reload_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ModuleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleManager")
            .field("tracked_modules", &self.manifests.len())
            .field("watching", &self.watch.is_some())
            .finish()
    }
}

impl ModuleManager {
    /// Registers freshly-fetched manifests (and their configs) into this
    /// manager's tracked set, without re-planning or transitioning
    /// anything. Callers that add modules after the fact are responsible
    /// for re-planning and calling `construct_all`/`start_all` themselves.
    pub fn add_modules(&self, manifests: Vec<ModuleManifest>, configs: &std::collections::HashMap<ModuleId, Value>) {
        for manifest in manifests {
            if let Some(config) = configs.get(&manifest.id) {
                self.configs.insert(manifest.id.clone(), config.clone());
            }
            self.manifests.insert(manifest.id.clone(), manifest);
        }
    }

    pub async fn construct_all(&self) {
        let plan = self.plan.read();
        let configs: std::collections::HashMap<ModuleId, Value> =
            self.configs.iter().map(|e| (e.key().clone(), e.value().clone())).collect();
        self.scheduler.construct_all(&plan, &configs).await;
    }

    pub async fn start_all(&self) {
        self.scheduler.start_all(&self.plan.read()).await;
    }

    pub async fn stop_all(&self) {
        self.scheduler.stop_all(&self.plan.read()).await;
    }

    pub async fn destroy_all(&self) {
        self.scheduler.destroy_all(&self.plan.read()).await;
    }

    pub async fn get_module(&self, id: &ModuleId) -> Option<ModuleHandle> {
        if !self.manifests.contains_key(id) {
            return None;
        }
        Some(ModuleHandle { id: id.clone(), state: self.scheduler.state_of(id).await })
    }

    /// The runtime module-resolution hook (spec §6): given a request made
    /// by code at `filename`, returns the path it resolves to, or `None`
    /// to fall through to the host's default resolution. `filename`
    /// absent (no caller context) also falls through.
    pub fn resolve_import(&self, request: &str, filename: Option<&std::path::Path>) -> antelope_core::Result<Option<std::path::PathBuf>> {
        let Some(filename) = filename else {
            return Ok(None);
        };
        self.path_resolver.resolve(filename, request)
    }

    /// Stops the background hot-reload task, if one is running. Idempotent.
    pub fn stop_watching(&mut self) {
        if let Some(cancel) = self.reload_cancel.take() {
            cancel.cancel();
        }
        if let Some(task) = self.reload_task.take() {
            task.abort();
        }
    }

    #[must_use]
    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }
}

impl Drop for ModuleManager {
    fn drop(&mut self) {
        self.stop_watching();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::RuntimeHooks;
    use antelope_core::{ExportDescriptor, InterfaceRef, ModuleSource, VersionSpec};
    use antelope_planner::Plan;
    use petgraph::graph::DiGraph;

    fn empty_manager(dir: &std::path::Path) -> ModuleManager {
        let manifests = Arc::new(DashMap::new());
        let plan = Arc::new(RwLock::new(Plan { providers: std::collections::HashMap::new(), graph: DiGraph::new(), order: Vec::new() }));
        let path_resolver = Arc::new(PathResolver::new(None));
        let proxies = Arc::new(ProxyTracker::new());
        let hooks = Arc::new(RuntimeHooks::new(manifests.clone(), plan.clone(), path_resolver.clone(), proxies.clone()));
        let scheduler = Arc::new(LifecycleScheduler::new(hooks, None));
        let cache = Arc::new(ModuleCache::open(dir).unwrap());
        let cache_lock = DirLock::acquire(dir).unwrap();

        ModuleManager {
            scheduler,
            path_resolver,
            proxies,
            manifests,
            plan,
            configs: Arc::new(DashMap::new()),
            cache,
            cache_lock,
            watch: None,
            reload_cancel: None,
            reload_task: None,
        }
    }

    fn manifest(id: &str) -> ModuleManifest {
        ModuleManifest {
            id: ModuleId::new(id),
            name: id.to_string(),
            version: semver::Version::new(1, 0, 0),
            folder: std::path::PathBuf::from(format!("/m/{id}")),
            main_entry: std::path::PathBuf::from("index.js"),
            exports_path: std::path::PathBuf::from(format!("/m/{id}/.exports")),
            exports: vec![ExportDescriptor { interface: InterfaceRef::new(id, "1"), range: VersionSpec::new("^1") }],
            imports: Vec::new(),
            optional_imports: Vec::new(),
            src_aliases: Vec::new(),
            watch_dir: None,
            source: ModuleSource::Local { path: std::path::PathBuf::from(format!("/m/{id}")), watch_dir: None },
        }
    }

    #[test]
    fn add_modules_tracks_manifests_and_matching_configs() {
        let dir = tempfile::tempdir().unwrap();
        let manager = empty_manager(dir.path());
        let mut configs = std::collections::HashMap::new();
        configs.insert(ModuleId::new("api"), serde_json::json!({"port": 80}));

        manager.add_modules(vec![manifest("api")], &configs);

        assert!(manager.manifests.contains_key(&ModuleId::new("api")));
        assert_eq!(manager.configs.get(&ModuleId::new("api")).unwrap().value()["port"], 80);
    }

    #[tokio::test]
    async fn unknown_module_lookup_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let manager = empty_manager(dir.path());
        assert!(manager.get_module(&ModuleId::new("ghost")).await.is_none());
    }

    #[test]
    fn resolve_import_without_filename_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let manager = empty_manager(dir.path());
        assert_eq!(manager.resolve_import("@ajs/db/1", None).unwrap(), None);
    }

    #[test]
    fn stop_watching_is_idempotent_with_no_watcher() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = empty_manager(dir.path());
        manager.stop_watching();
        manager.stop_watching();
    }
}
