//! `manifest.json`: ModuleId -> installed semver (spec §3, §4.2).

use antelope_core::ModuleId;
use semver::Version;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
pub struct CacheManifest {
    versions: HashMap<ModuleId, Version>,
}

impl CacheManifest {
    /// Read `<cacheFolder>/manifest.json`, tolerating a missing file or a
    /// literal JSON `null` (spec §4.2 `load()`).
    pub fn load(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let raw: Option<HashMap<String, String>> =
            serde_json::from_str(&text).map_err(io::Error::other)?;
        let Some(raw) = raw else {
            return Ok(Self::default());
        };
        let mut versions = HashMap::new();
        for (id, version) in raw {
            if let Ok(v) = Version::parse(&version) {
                versions.insert(ModuleId::new(id), v);
            }
        }
        Ok(Self { versions })
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let raw: HashMap<String, String> = self
            .versions
            .iter()
            .map(|(id, v)| (id.as_str().to_string(), v.to_string()))
            .collect();
        let text = serde_json::to_string_pretty(&raw).map_err(io::Error::other)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)
    }

    #[must_use]
    pub fn get(&self, id: &ModuleId) -> Option<&Version> {
        self.versions.get(id)
    }

    pub fn set(&mut self, id: ModuleId, version: Version) {
        self.versions.insert(id, version);
    }

    #[must_use]
    pub fn has_version(&self, id: &ModuleId, range: &semver::VersionReq) -> bool {
        self.versions.get(id).is_some_and(|v| range.matches(v))
    }
}

/// Path helper for the manifest file under a cache folder.
#[must_use]
pub fn manifest_path(cache_folder: &Path) -> PathBuf {
    cache_folder.join("manifest.json")
}
