//! `launch`/`build`/`launchFromBuild` (spec §6 Scheduler API surface).

use crate::build::{BuildArtifact, BuildDiagnostic, BuiltImportOverride, BuiltModuleEntry};
use crate::hooks::RuntimeHooks;
use crate::manager::ModuleManager;
use crate::options::LaunchOptions;
use crate::reloader::RegistryReloader;
use antelope_cache::ModuleCache;
use antelope_config::{ConfigResolver, ResolvedModuleEntry, ResolvedProjectConfig};
use antelope_core::{DashMap, Error, ModuleId, ModuleManifest, Result, RwLock};
use antelope_loader::{PathResolver, ProxyTracker};
use antelope_planner::{DependencyPlanner, Plan, ProviderOutcome};
use antelope_reload::HotReload;
use antelope_registry::SourceRegistry;
use antelope_scheduler::LifecycleScheduler;
use antelope_watch::WatchEngine;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Resolves the project config, fetches every module's source, and plans
/// it, failing fast on the first fetch error (spec §7: "in launch,
/// fatal").
async fn resolve_and_fetch(
    project_root: &Path,
    options: &LaunchOptions,
) -> Result<(ResolvedProjectConfig, Vec<ModuleManifest>, Arc<ModuleCache>, Arc<SourceRegistry>)> {
    let resolved = ConfigResolver::new().resolve(project_root, options.env.as_deref(), options.config_path.as_deref())?;
    let cache = Arc::new(ModuleCache::open(&resolved.cache_folder)?);
    let registry = Arc::new(SourceRegistry::new());

    let mut manifests = Vec::new();
    for (id, entry) in &resolved.modules {
        let fetched = registry.fetch(&cache, id, entry.source.clone()).await?;
        manifests.extend(fetched);
    }
    Ok((resolved, manifests, cache, registry))
}

/// Plans the given manifests, failing on the first strict-import diagnostic
/// (spec §8 scenarios B/C: ambiguity and missing-strict are both fatal at
/// launch, with "no module enters Constructed").
fn plan_or_fail(manifests: &[ModuleManifest], entries: &HashMap<ModuleId, ResolvedModuleEntry>) -> Result<Plan> {
    let plan = DependencyPlanner::new().plan(manifests, entries)?;

    let mut diagnostics: Vec<_> = plan.diagnostics().collect();
    diagnostics.sort_by_key(|((consumer, interface), _)| (consumer.as_str().to_string(), interface.as_key()));
    for ((consumer, interface), outcome) in &diagnostics {
        error!(module = %consumer, interface = %interface, outcome = ?outcome, "unresolved strict import");
    }
    if let Some(((consumer, interface), outcome)) = diagnostics.first() {
        return Err(match outcome {
            ProviderOutcome::Ambiguous(candidates) => Error::AmbiguousProvider {
                consumer: (*consumer).clone(),
                interface: interface.as_key(),
                candidates: candidates.clone(),
            },
            _ => Error::MissingProvider { consumer: (*consumer).clone(), interface: interface.as_key() },
        });
    }
    Ok(plan)
}

/// Wires a planned module set into a running `ModuleManager`: scheduler,
/// `PathResolver`, `ProxyTracker`, and (if requested) `WatchEngine` +
/// `HotReload`, then constructs and starts everything.
#[allow(clippy::too_many_arguments)]
async fn assemble(
    manifests: Vec<ModuleManifest>,
    entries: HashMap<ModuleId, ResolvedModuleEntry>,
    plan: Plan,
    cache: Arc<ModuleCache>,
    registry: Arc<SourceRegistry>,
    options: &LaunchOptions,
) -> Result<ModuleManager> {
    let cache_lock = cache.lock()?;

    let manifests_map = Arc::new(DashMap::new());
    let configs: Arc<DashMap<ModuleId, Value>> = Arc::new(DashMap::new());
    for manifest in &manifests {
        if let Some(entry) = entries.get(&manifest.id) {
            configs.insert(manifest.id.clone(), entry.config.clone());
        }
        manifests_map.insert(manifest.id.clone(), manifest.clone());
    }

    let plan = Arc::new(RwLock::new(plan));
    let path_resolver = Arc::new(PathResolver::new(options.stub_module_path.clone()));
    let proxies = Arc::new(ProxyTracker::new());

    let hooks = Arc::new(RuntimeHooks::new(manifests_map.clone(), plan.clone(), path_resolver.clone(), proxies.clone()));
    let scheduler = Arc::new(LifecycleScheduler::new(hooks, options.concurrency));

    scheduler_run(&scheduler, &plan, &configs).await;

    let entries = Arc::new(entries);

    let (watch, reload_cancel, reload_task) = if options.watch {
        let (engine, changes) = WatchEngine::new().map_err(|e| Error::WatchError {
            module: ModuleId::new("<project>"),
            reason: e.to_string(),
        })?;
        let engine = Arc::new(engine);
        for manifest in &manifests {
            let dirs = manifest.resolved_watch_dirs();
            if dirs.is_empty() {
                continue;
            }
            if let Err(e) = engine.watch_module(&manifest.id, &dirs) {
                warn!(module = %manifest.id, error = %e, "failed to install watcher, module will not hot-reload");
            }
        }

        let reloader = Arc::new(RegistryReloader::new(registry, cache.clone(), entries.clone()));
        let hot_reload = Arc::new(HotReload::new(
            scheduler.clone(),
            path_resolver.clone(),
            proxies.clone(),
            reloader,
            antelope_reload::DEFAULT_DEBOUNCE_WINDOW,
        ));
        let cancel = hot_reload.cancel_token();

        let task_manifests = manifests_map.clone();
        let task_plan = plan.clone();
        let task_entries = entries.clone();
        let task_configs = configs.clone();
        let task = tokio::spawn(async move {
            hot_reload.run(changes, task_manifests, task_plan, task_entries, task_configs).await;
        });
        (Some(engine), Some(cancel), Some(task))
    } else {
        (None, None, None)
    };

    info!(modules = manifests_map.len(), watching = options.watch, "project launched");

    Ok(ModuleManager {
        scheduler,
        path_resolver,
        proxies,
        manifests: manifests_map,
        plan,
        configs,
        cache,
        cache_lock,
        watch,
        reload_cancel,
        reload_task,
    })
}

async fn scheduler_run(scheduler: &Arc<LifecycleScheduler>, plan: &Arc<RwLock<Plan>>, configs: &Arc<DashMap<ModuleId, Value>>) {
    let snapshot: HashMap<ModuleId, Value> = configs.iter().map(|e| (e.key().clone(), e.value().clone())).collect();
    scheduler.construct_all(&plan.read(), &snapshot).await;
    scheduler.start_all(&plan.read()).await;
}

/// Resolves the project, fetches every module, plans them, and constructs
/// and starts the whole set (spec §6: `launch`).
pub async fn launch(project_root: &Path, options: LaunchOptions) -> Result<ModuleManager> {
    let (resolved, manifests, cache, registry) = resolve_and_fetch(project_root, &options).await?;
    let plan = plan_or_fail(&manifests, &resolved.modules)?;
    assemble(manifests, resolved.modules, plan, cache, registry, &options).await
}

/// Resolves and fetches every module, skipping construction entirely, and
/// saves the result as a `BuildArtifact` next to the project's cache
/// (spec §6: `build`). Unlike `launch`, a per-module `SourceFetchError` is
/// non-fatal here: the offending module is skipped (spec §7).
pub async fn build(project_root: &Path, options: LaunchOptions) -> Result<BuildArtifact> {
    let resolved = ConfigResolver::new().resolve(project_root, options.env.as_deref(), options.config_path.as_deref())?;
    let cache = ModuleCache::open(&resolved.cache_folder)?;
    let registry = SourceRegistry::new();

    let mut manifests = Vec::new();
    let mut skipped = Vec::new();
    for (id, entry) in &resolved.modules {
        match registry.fetch(&cache, id, entry.source.clone()).await {
            Ok(fetched) => manifests.extend(fetched),
            Err(e) => {
                warn!(module = %id, error = %e, "skipping module in build, source fetch failed");
                skipped.push(BuildDiagnostic { module: id.as_str().to_string(), reason: e.to_string() });
            }
        }
    }

    if let Ok(plan) = DependencyPlanner::new().plan(&manifests, &resolved.modules) {
        for ((consumer, interface), outcome) in plan.diagnostics() {
            warn!(module = %consumer, interface = %interface, outcome = ?outcome, "unresolved strict import in build (non-fatal)");
        }
    }

    let configs: HashMap<ModuleId, Value> =
        resolved.modules.iter().map(|(id, entry)| (id.clone(), entry.config.clone())).collect();
    let entries: HashMap<ModuleId, BuiltModuleEntry> = resolved
        .modules
        .iter()
        .map(|(id, entry)| {
            let import_overrides = entry
                .import_overrides
                .iter()
                .map(|o| BuiltImportOverride {
                    interface: o.interface.as_key(),
                    provider_module_id: o.provider_module_id.as_str().to_string(),
                    provider_export_id: o.provider_export_id.clone(),
                })
                .collect();
            (id.clone(), BuiltModuleEntry { import_overrides, disabled_exports: entry.disabled_exports.clone() })
        })
        .collect();

    let artifact = BuildArtifact { manifests, configs, entries, skipped };
    artifact.save(&resolved.cache_folder)?;
    Ok(artifact)
}

/// Launches from a previously saved `BuildArtifact`, skipping
/// `ConfigResolver` and `SourceRegistry` entirely (spec §6:
/// `launchFromBuild`).
pub async fn launch_from_build(project_root: &Path, options: LaunchOptions) -> Result<ModuleManager> {
    let resolved = ConfigResolver::new().resolve(project_root, options.env.as_deref(), options.config_path.as_deref())?;
    let artifact = BuildArtifact::load(&resolved.cache_folder)?;
    let cache = Arc::new(ModuleCache::open(&resolved.cache_folder)?);
    let registry = Arc::new(SourceRegistry::new());

    let entries = artifact.resolved_entries();
    let plan = plan_or_fail(&artifact.manifests, &entries)?;
    assemble(artifact.manifests, entries, plan, cache, registry, &options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use antelope_core::LifecycleState;
    use std::path::Path;

    fn write_module(root: &Path, exports: &[(&str, &str)], imports: &[&str], optional_imports: &[&str]) {
        std::fs::create_dir_all(root).unwrap();
        let exports: Vec<String> =
            exports.iter().map(|(i, r)| format!(r#"{{"interface":"{i}","range":"{r}"}}"#)).collect();
        let imports: Vec<String> = imports.iter().map(|s| format!("\"{s}\"")).collect();
        let optional: Vec<String> = optional_imports.iter().map(|s| format!("\"{s}\"")).collect();
        std::fs::write(
            root.join("ajs-module.json"),
            format!(
                r#"{{"name":"m","version":"1.0.0","mainEntry":"index.js","exportsPath":".exports",
                "exports":[{}],"imports":[{}],"optionalImports":[{}]}}"#,
                exports.join(","),
                imports.join(","),
                optional.join(",")
            ),
        )
        .unwrap();
    }

    fn write_config(project_root: &Path, contents: &str) {
        std::fs::write(project_root.join("antelope.json"), contents).unwrap();
    }

    #[tokio::test]
    async fn scenario_a_happy_launch_with_override() {
        let project = tempfile::tempdir().unwrap();
        let api_dir = project.path().join("api");
        let pg_dir = project.path().join("pg");
        write_module(&api_dir, &[], &["db@1"], &[]);
        write_module(&pg_dir, &[("db@1", "^1")], &[], &[]);

        write_config(
            project.path(),
            &format!(
                r#"{{"name":"app","modules":{{
                    "api":{{"source":{{"type":"local","path":"{api}"}},"importOverrides":[{{"interface":"db@1","source":"pg"}}]}},
                    "pg":{{"source":{{"type":"local","path":"{pg}"}}}}
                }}}}"#,
                api = api_dir.display(),
                pg = pg_dir.display(),
            ),
        );

        let manager = launch(project.path(), LaunchOptions::default()).await.unwrap();

        let api = manager.get_module(&ModuleId::new("api")).await.unwrap();
        assert!(matches!(api.state, LifecycleState::Active));
        let pg = manager.get_module(&ModuleId::new("pg")).await.unwrap();
        assert!(matches!(pg.state, LifecycleState::Active));
    }

    #[tokio::test]
    async fn scenario_b_ambiguous_provider_is_fatal() {
        let project = tempfile::tempdir().unwrap();
        let api_dir = project.path().join("api");
        let pg1_dir = project.path().join("pg1");
        let pg2_dir = project.path().join("pg2");
        write_module(&api_dir, &[], &["db@1"], &[]);
        write_module(&pg1_dir, &[("db@1", "^1")], &[], &[]);
        write_module(&pg2_dir, &[("db@1", "^1")], &[], &[]);

        write_config(
            project.path(),
            &format!(
                r#"{{"name":"app","modules":{{
                    "api":{{"source":{{"type":"local","path":"{api}"}}}},
                    "pg1":{{"source":{{"type":"local","path":"{pg1}"}}}},
                    "pg2":{{"source":{{"type":"local","path":"{pg2}"}}}}
                }}}}"#,
                api = api_dir.display(),
                pg1 = pg1_dir.display(),
                pg2 = pg2_dir.display(),
            ),
        );

        let err = launch(project.path(), LaunchOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::AmbiguousProvider { .. }));
    }

    #[tokio::test]
    async fn scenario_c_missing_strict_provider_is_fatal() {
        let project = tempfile::tempdir().unwrap();
        let api_dir = project.path().join("api");
        write_module(&api_dir, &[], &["db@1"], &[]);

        write_config(
            project.path(),
            &format!(r#"{{"name":"app","modules":{{"api":{{"source":{{"type":"local","path":"{api}"}}}}}}}}"#, api = api_dir.display()),
        );

        let err = launch(project.path(), LaunchOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::MissingProvider { .. }));
    }

    #[tokio::test]
    async fn scenario_d_optional_missing_falls_back_to_stub() {
        let project = tempfile::tempdir().unwrap();
        let api_dir = project.path().join("api");
        let stub = project.path().join("stub.js");
        std::fs::write(&stub, "").unwrap();
        write_module(&api_dir, &[], &[], &["cache@1"]);

        write_config(
            project.path(),
            &format!(r#"{{"name":"app","modules":{{"api":{{"source":{{"type":"local","path":"{api}"}}}}}}}}"#, api = api_dir.display()),
        );

        let options = LaunchOptions { stub_module_path: Some(stub.clone()), ..LaunchOptions::default() };
        let manager = launch(project.path(), options).await.unwrap();

        let resolved = manager
            .resolve_import("@ajs/cache/1", Some(&api_dir.join("index.js")))
            .unwrap();
        assert_eq!(resolved, Some(stub));
    }

    #[tokio::test]
    async fn build_then_launch_from_build_skips_resolution() {
        let project = tempfile::tempdir().unwrap();
        let api_dir = project.path().join("api");
        write_module(&api_dir, &[], &[], &[]);

        write_config(
            project.path(),
            &format!(r#"{{"name":"app","modules":{{"api":{{"source":{{"type":"local","path":"{api}"}}}}}}}}"#, api = api_dir.display()),
        );

        let artifact = build(project.path(), LaunchOptions::default()).await.unwrap();
        assert_eq!(artifact.manifests.len(), 1);
        assert!(artifact.skipped.is_empty());

        let manager = launch_from_build(project.path(), LaunchOptions::default()).await.unwrap();
        let api = manager.get_module(&ModuleId::new("api")).await.unwrap();
        assert!(matches!(api.state, LifecycleState::Active));
    }

    #[tokio::test]
    async fn build_skips_modules_whose_source_fetch_fails() {
        let project = tempfile::tempdir().unwrap();
        let missing = project.path().join("does-not-exist");

        write_config(
            project.path(),
            &format!(r#"{{"name":"app","modules":{{"api":{{"source":{{"type":"local","path":"{missing}"}}}}}}}}"#, missing = missing.display()),
        );

        let artifact = build(project.path(), LaunchOptions::default()).await.unwrap();
        assert!(artifact.manifests.is_empty());
        assert_eq!(artifact.skipped.len(), 1);
        assert_eq!(artifact.skipped[0].module, "api");
    }

    #[tokio::test]
    async fn stop_destroy_cycle_tears_modules_back_down() {
        let project = tempfile::tempdir().unwrap();
        let api_dir = project.path().join("api");
        write_module(&api_dir, &[], &[], &[]);

        write_config(
            project.path(),
            &format!(r#"{{"name":"app","modules":{{"api":{{"source":{{"type":"local","path":"{api}"}}}}}}}}"#, api = api_dir.display()),
        );

        let manager = launch(project.path(), LaunchOptions::default()).await.unwrap();
        manager.stop_all().await;
        manager.destroy_all().await;
        let api = manager.get_module(&ModuleId::new("api")).await.unwrap();
        assert!(matches!(api.state, LifecycleState::Loaded));
    }
}
