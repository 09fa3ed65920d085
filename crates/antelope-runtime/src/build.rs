//! The saved artifact `build()` produces and `launchFromBuild()` consumes
//! (spec §6): a resolution result frozen to disk so a later launch can
//! skip `ConfigResolver` and `SourceRegistry` entirely.

use antelope_config::{ResolvedImportOverride, ResolvedModuleEntry};
use antelope_core::{Error, InterfaceRef, ModuleId, ModuleManifest, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

pub const BUILD_ARTIFACT_FILE_NAME: &str = "build.json";

/// A serializable stand-in for `ResolvedImportOverride` (which borrows
/// nothing unusual, but round-trips more simply as plain strings here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltImportOverride {
    pub interface: String,
    pub provider_module_id: String,
    pub provider_export_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltModuleEntry {
    pub import_overrides: Vec<BuiltImportOverride>,
    pub disabled_exports: Vec<String>,
}

/// Every module this build attempted to fetch, and what happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildDiagnostic {
    pub module: String,
    pub reason: String,
}

/// A frozen resolution result: every manifest that was successfully
/// fetched, its resolved config, and the override/disable data the
/// planner needs — everything `launchFromBuild` needs to skip back to
/// planning without touching `ConfigResolver`/`SourceRegistry` again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildArtifact {
    pub manifests: Vec<ModuleManifest>,
    pub configs: HashMap<ModuleId, Value>,
    pub entries: HashMap<ModuleId, BuiltModuleEntry>,
    /// Modules whose fetch failed and were skipped (spec §7:
    /// `SourceFetchError` is non-fatal during `build`).
    pub skipped: Vec<BuildDiagnostic>,
}

impl BuildArtifact {
    pub fn save(&self, cache_folder: &Path) -> Result<()> {
        let path = cache_folder.join(BUILD_ARTIFACT_FILE_NAME);
        let text = serde_json::to_string_pretty(self).expect("BuildArtifact is always serializable");
        std::fs::write(&path, text)?;
        Ok(())
    }

    pub fn load(cache_folder: &Path) -> Result<Self> {
        let path = cache_folder.join(BUILD_ARTIFACT_FILE_NAME);
        let text = std::fs::read_to_string(&path)?;
        serde_json::from_str(&text).map_err(|source| Error::ConfigParseError { path, source })
    }

    /// Reconstructs the `ResolvedModuleEntry` map `DependencyPlanner` needs,
    /// pairing each built entry back up with the manifest it came from for
    /// the `source`/`config` fields a bare `BuiltModuleEntry` doesn't carry.
    #[must_use]
    pub fn resolved_entries(&self) -> HashMap<ModuleId, ResolvedModuleEntry> {
        let mut out = HashMap::new();
        for manifest in &self.manifests {
            let Some(built) = self.entries.get(&manifest.id) else {
                continue;
            };
            let import_overrides = built
                .import_overrides
                .iter()
                .filter_map(|o| {
                    InterfaceRef::parse(&o.interface).map(|interface| ResolvedImportOverride {
                        interface,
                        provider_module_id: ModuleId::new(o.provider_module_id.clone()),
                        provider_export_id: o.provider_export_id.clone(),
                    })
                })
                .collect();
            out.insert(
                manifest.id.clone(),
                ResolvedModuleEntry {
                    source: manifest.source.clone(),
                    config: self.configs.get(&manifest.id).cloned().unwrap_or(Value::Null),
                    import_overrides,
                    disabled_exports: built.disabled_exports.clone(),
                },
            );
        }
        out
    }
}
