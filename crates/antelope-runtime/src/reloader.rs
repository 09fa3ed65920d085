//! The production `ManifestReloader`: re-runs the same source-registry
//! fetch that produced a module's manifest in the first place (spec §4.9
//! step 3, §4.3).

use antelope_cache::ModuleCache;
use antelope_config::ResolvedModuleEntry;
use antelope_core::{Error, ModuleId, ModuleManifest, Result};
use antelope_reload::ManifestReloader;
use antelope_registry::SourceRegistry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub struct RegistryReloader {
    registry: Arc<SourceRegistry>,
    cache: Arc<ModuleCache>,
    entries: Arc<HashMap<ModuleId, ResolvedModuleEntry>>,
}

impl RegistryReloader {
    #[must_use]
    pub fn new(
        registry: Arc<SourceRegistry>,
        cache: Arc<ModuleCache>,
        entries: Arc<HashMap<ModuleId, ResolvedModuleEntry>>,
    ) -> Self {
        Self { registry, cache, entries }
    }
}

#[async_trait]
impl ManifestReloader for RegistryReloader {
    async fn reload(&self, id: &ModuleId) -> Result<ModuleManifest> {
        let entry = self.entries.get(id).ok_or_else(|| Error::ReloadFailure {
            module: id.clone(),
            reason: "module has no registered source entry".to_string(),
        })?;

        let manifests = self.registry.fetch(&self.cache, id, entry.source.clone()).await?;
        manifests
            .into_iter()
            .find(|m| &m.id == id)
            .ok_or_else(|| Error::ReloadFailure {
                module: id.clone(),
                reason: "re-fetch did not yield a manifest for this module id".to_string(),
            })
    }
}
