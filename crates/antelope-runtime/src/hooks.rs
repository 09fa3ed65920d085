//! The `ModuleHooks` implementation `LifecycleScheduler` drives.
//!
//! `PathResolver`'s folder/association maps and `ProxyTracker`'s buckets
//! are "updated only by the scheduler during state transitions" (spec §5
//! shared-resource policy); this is where that update happens.

use antelope_core::{ModuleId, ModuleManifest, Result};
use antelope_loader::{Association, PathResolver, ProxyTracker};
use antelope_planner::{Plan, ProviderOutcome};
use antelope_core::{DashMap, RwLock};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct RuntimeHooks {
    manifests: Arc<DashMap<ModuleId, ModuleManifest>>,
    plan: Arc<RwLock<Plan>>,
    path_resolver: Arc<PathResolver>,
    proxies: Arc<ProxyTracker>,
}

impl RuntimeHooks {
    #[must_use]
    pub fn new(
        manifests: Arc<DashMap<ModuleId, ModuleManifest>>,
        plan: Arc<RwLock<Plan>>,
        path_resolver: Arc<PathResolver>,
        proxies: Arc<ProxyTracker>,
    ) -> Self {
        Self { manifests, plan, path_resolver, proxies }
    }
}

#[async_trait]
impl antelope_scheduler::ModuleHooks for RuntimeHooks {
    async fn construct(&self, id: &ModuleId, _config: &Value) -> Result<()> {
        let Some(manifest) = self.manifests.get(id).map(|m| m.clone()) else {
            return Ok(());
        };

        self.path_resolver.register_module(
            id,
            manifest.folder.clone(),
            manifest.exports_path.clone(),
            manifest.src_aliases.clone(),
            manifest.optional_imports.clone(),
        );

        let associations: Vec<(antelope_core::InterfaceRef, Association)> = self
            .plan
            .read()
            .providers
            .iter()
            .filter(|((consumer, _), _)| consumer == id)
            .filter_map(|((_, interface), outcome)| match outcome {
                ProviderOutcome::Resolved { provider, .. } => {
                    Some((interface.clone(), Association { provider: provider.clone() }))
                }
                _ => None,
            })
            .collect();
        self.path_resolver.set_associations(id, associations);

        debug!(module = %id, "constructed");
        Ok(())
    }

    async fn start(&self, id: &ModuleId) -> Result<()> {
        debug!(module = %id, "started");
        Ok(())
    }

    async fn stop(&self, id: &ModuleId) -> Result<()> {
        debug!(module = %id, "stopped");
        Ok(())
    }

    async fn destroy(&self, id: &ModuleId) -> Result<()> {
        self.path_resolver.unregister_module(id);
        self.proxies.clear(id);
        debug!(module = %id, "destroyed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antelope_core::{ExportDescriptor, ModuleSource, VersionSpec};
    use antelope_scheduler::ModuleHooks as _;
    use petgraph::graph::DiGraph;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn manifest(id: &str) -> ModuleManifest {
        ModuleManifest {
            id: ModuleId::new(id),
            name: id.to_string(),
            version: semver::Version::new(1, 0, 0),
            folder: PathBuf::from(format!("/m/{id}")),
            main_entry: PathBuf::from("index.js"),
            exports_path: PathBuf::from(format!("/m/{id}/.exports")),
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

    #[tokio::test]
    async fn construct_registers_module_and_its_resolved_associations() {
        let manifests = Arc::new(DashMap::new());
        manifests.insert(ModuleId::new("api"), manifest("api"));
        manifests.insert(ModuleId::new("db"), manifest("db"));

        let mut providers = HashMap::new();
        providers.insert(
            (ModuleId::new("api"), antelope_core::InterfaceRef::new("db", "1")),
            ProviderOutcome::Resolved { provider: ModuleId::new("db"), export_id: None },
        );
        let plan = Arc::new(RwLock::new(Plan { providers, graph: DiGraph::new(), order: Vec::new() }));

        let path_resolver = Arc::new(PathResolver::new(None));
        let proxies = Arc::new(ProxyTracker::new());
        let hooks = RuntimeHooks::new(manifests, plan, path_resolver.clone(), proxies);

        hooks.construct(&ModuleId::new("db"), &Value::Null).await.unwrap();
        hooks.construct(&ModuleId::new("api"), &Value::Null).await.unwrap();

        let resolved = path_resolver
            .resolve(std::path::Path::new("/m/api/src/index.js"), "@ajs/db/1/x.js")
            .unwrap();
        assert_eq!(resolved, Some(PathBuf::from("/m/db/.exports/db/1/x.js")));
    }

    #[tokio::test]
    async fn destroy_clears_path_resolver_and_proxies() {
        let manifests = Arc::new(DashMap::new());
        manifests.insert(ModuleId::new("api"), manifest("api"));
        let plan = Arc::new(RwLock::new(Plan { providers: HashMap::new(), graph: DiGraph::new(), order: Vec::new() }));
        let path_resolver = Arc::new(PathResolver::new(None));
        let proxies = Arc::new(ProxyTracker::new());
        let hooks = RuntimeHooks::new(manifests, plan, path_resolver.clone(), proxies.clone());

        hooks.construct(&ModuleId::new("api"), &Value::Null).await.unwrap();
        proxies.register_async(&ModuleId::new("api"), serde_json::json!(1));

        hooks.destroy(&ModuleId::new("api")).await.unwrap();

        assert!(path_resolver.find_caller(std::path::Path::new("/m/api/index.js")).is_none());
        assert!(proxies.async_proxies(&ModuleId::new("api")).is_empty());
    }
}
