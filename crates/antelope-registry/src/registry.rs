//! `SourceRegistry` (spec §4.3): dispatches a `ModuleSource` to its
//! downloader and produces the resulting `ModuleManifest`s.

use crate::downloaders::{git, local, package};
use antelope_cache::ModuleCache;
use antelope_core::{ModuleId, ModuleManifest, ModuleSource, Result};

#[derive(Debug)]
pub struct SourceRegistry {
    http: reqwest::Client,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Fetch `id`'s source, producing one or more manifests (a
    /// `local-folder` source fans out to one manifest per sub-directory).
    pub async fn fetch(
        &self,
        cache: &ModuleCache,
        id: &ModuleId,
        source: ModuleSource,
    ) -> Result<Vec<ModuleManifest>> {
        match &source {
            ModuleSource::Package { name, version, .. } => {
                package::fetch(&self.http, cache, id, name, version, source.clone()).await
            }
            ModuleSource::Git {
                remote,
                branch,
                commit,
                ..
            } => git::fetch(
                cache,
                id,
                remote,
                branch.as_deref(),
                commit.as_deref(),
                source.clone(),
            ),
            ModuleSource::Local { path, .. } => local::fetch(id, path, source.clone()),
            ModuleSource::LocalFolder { path, watch_dir } => {
                local::fetch_folder(id, path, watch_dir)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_module(root: &std::path::Path, name: &str) {
        std::fs::create_dir_all(root).unwrap();
        std::fs::write(
            root.join("ajs-module.json"),
            format!(
                r#"{{"name": "{name}", "version": "1.0.0", "mainEntry": "index.js", "exportsPath": ".exports"}}"#
            ),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn local_source_is_dispatched_without_network() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "api");
        let cache_dir = tempfile::tempdir().unwrap();
        let cache = ModuleCache::open(cache_dir.path()).unwrap();

        let registry = SourceRegistry::new();
        let source = ModuleSource::Local {
            path: dir.path().to_path_buf(),
            watch_dir: None,
        };
        let manifests = registry
            .fetch(&cache, &ModuleId::new("api"), source)
            .await
            .unwrap();
        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].name, "api");
    }

    #[tokio::test]
    async fn local_folder_source_fans_out_to_multiple_manifests() {
        let dir = tempfile::tempdir().unwrap();
        write_module(&dir.path().join("api"), "api");
        write_module(&dir.path().join("db"), "db");
        let cache_dir = tempfile::tempdir().unwrap();
        let cache = ModuleCache::open(cache_dir.path()).unwrap();

        let registry = SourceRegistry::new();
        let source = ModuleSource::LocalFolder {
            path: dir.path().to_path_buf(),
            watch_dir: None,
        };
        let manifests = registry
            .fetch(&cache, &ModuleId::new("modules"), source)
            .await
            .unwrap();
        assert_eq!(manifests.len(), 2);
    }
}
