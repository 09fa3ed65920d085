//! `ModuleCache` (spec §4.2).

use crate::manifest::{manifest_path, CacheManifest};
use antelope_core::{Error, ModuleId, Result};
use antelope_platform::{replace_dir, scoped_temp_dir, DirLock};
use parking_lot::RwLock;
use semver::{Version, VersionReq};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Owns `<cacheFolder>/<moduleId>/`, the `manifest.json` sibling, and
/// process-scoped temp directory allocation.
#[derive(Debug)]
pub struct ModuleCache {
    root: PathBuf,
    manifest: RwLock<CacheManifest>,
}

impl ModuleCache {
    /// Open (but do not yet load) a cache rooted at `cache_folder`.
    pub fn open(cache_folder: impl Into<PathBuf>) -> Result<Self> {
        let root = cache_folder.into();
        std::fs::create_dir_all(&root)?;
        let manifest = CacheManifest::load(&manifest_path(&root))?;
        Ok(Self {
            root,
            manifest: RwLock::new(manifest),
        })
    }

    /// Re-read `manifest.json`, discarding any in-memory, unsaved changes.
    pub fn load(&self) -> Result<()> {
        let fresh = CacheManifest::load(&manifest_path(&self.root))?;
        *self.manifest.write() = fresh;
        Ok(())
    }

    /// Persist the in-memory manifest.
    pub fn save(&self) -> Result<()> {
        self.manifest.read().save(&manifest_path(&self.root))?;
        Ok(())
    }

    #[must_use]
    pub fn get_version(&self, id: &ModuleId) -> Option<Version> {
        self.manifest.read().get(id).cloned()
    }

    pub fn set_version(&self, id: ModuleId, version: Version) {
        self.manifest.write().set(id, version);
    }

    #[must_use]
    pub fn has_version(&self, id: &ModuleId, range: &VersionReq) -> bool {
        self.manifest.read().has_version(id, range)
    }

    /// `<cache>/<id>`, optionally wiped and recreated.
    pub fn get_folder(&self, id: &ModuleId, clean: bool) -> Result<PathBuf> {
        let folder = self.root.join(id.as_str());
        if clean {
            if folder.exists() {
                std::fs::remove_dir_all(&folder)?;
            }
            std::fs::create_dir_all(&folder)?;
        } else {
            std::fs::create_dir_all(&folder)?;
        }
        Ok(folder)
    }

    /// Move a staged directory into place and record the version.
    ///
    /// Leaves the destination fully populated on success or untouched on
    /// failure (spec §4.2 guarantee, §8 scenario F).
    pub fn transfer(&self, staged: &Path, id: &ModuleId, version: Version) -> Result<PathBuf> {
        let dest = self.root.join(id.as_str());
        info!(module = %id, version = %version, "transferring staged module into cache");
        replace_dir(staged, &dest).map_err(|source| Error::CacheIo {
            module: id.clone(),
            source,
        })?;
        self.set_version(id.clone(), version);
        self.save()?;
        Ok(dest)
    }

    /// A fresh process-scoped temp directory for staging a fetch before
    /// `transfer`.
    pub fn get_temp(&self) -> Result<TempDir> {
        scoped_temp_dir("antelope-cache-").map_err(Error::Io)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Take the advisory cache-root lock for the duration of a scheduler
    /// run, guarding against a second runtime instance touching this cache
    /// concurrently.
    pub fn lock(&self) -> Result<DirLock> {
        DirLock::acquire(&self.root).map_err(Error::Io)
    }
}
