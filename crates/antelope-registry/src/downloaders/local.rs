//! `local` and `local-folder` downloaders — no fetch, reference files in place.

use crate::manifest_file;
use antelope_core::{Error, ModuleId, ModuleManifest, ModuleSource, Result};
use std::path::Path;
use tracing::debug;

/// `local`: the module lives at `path` already; just read its manifest.
pub fn fetch(id: &ModuleId, path: &Path, source: ModuleSource) -> Result<Vec<ModuleManifest>> {
    if !path.is_dir() {
        return Err(Error::SourceFetchError {
            module: id.clone(),
            reason: format!("local path {} does not exist or is not a directory", path.display()),
        });
    }
    Ok(vec![manifest_file::read(id, path, source)?])
}

/// `local-folder`: `path` holds one sub-directory per module; each
/// sub-directory carrying `ajs-module.json` becomes its own manifest.
pub fn fetch_folder(
    parent_id: &ModuleId,
    path: &Path,
    watch_dir: &Option<antelope_core::manifest::WatchDir>,
) -> Result<Vec<ModuleManifest>> {
    if !path.is_dir() {
        return Err(Error::SourceFetchError {
            module: parent_id.clone(),
            reason: format!("local-folder path {} does not exist or is not a directory", path.display()),
        });
    }

    let mut manifests = Vec::new();
    let entries = std::fs::read_dir(path).map_err(Error::Io)?;
    for entry in entries {
        let entry = entry.map_err(Error::Io)?;
        let sub_path = entry.path();
        if !sub_path.is_dir() {
            continue;
        }
        if !manifest_file::has_manifest_file(&sub_path) {
            debug!(path = %sub_path.display(), "skipping sub-directory without ajs-module.json");
            continue;
        }
        let sub_name = entry.file_name().to_string_lossy().into_owned();
        let sub_id = ModuleId::new(sub_name);
        let source = ModuleSource::LocalFolder {
            path: sub_path.clone(),
            watch_dir: watch_dir.clone(),
        };
        manifests.push(manifest_file::read(&sub_id, &sub_path, source)?);
    }
    Ok(manifests)
}
