//! The `ConfigResolver` (spec §4.1).

use crate::interpolate::{interpolate, scalar_field_table};
use crate::merge::merge_right_wins;
use crate::shorthand;
use crate::types::{
    RawImportOverride, RawModuleEntry, RawProjectConfig, ResolvedImportOverride,
    ResolvedModuleEntry, ResolvedProjectConfig,
};
use antelope_core::{Error, InterfaceRef, ModuleId, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG_NAME: &str = "antelope.json";

/// Reads the project configuration, applies environment overlays, expands
/// shorthands, interpolates templates, and merges per-module side-cars.
#[derive(Debug, Default)]
pub struct ConfigResolver;

impl ConfigResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Resolve the project configuration at `project_root`.
    pub fn resolve(
        &self,
        project_root: &Path,
        env: Option<&str>,
        explicit_config_path: Option<&Path>,
    ) -> Result<ResolvedProjectConfig> {
        let config_path = explicit_config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_root.join(DEFAULT_CONFIG_NAME));

        if !config_path.exists() {
            return Err(Error::ConfigMissing { path: config_path });
        }

        let text = std::fs::read_to_string(&config_path)?;
        let mut doc: RawProjectConfig =
            serde_json::from_str(&text).map_err(|source| Error::ConfigParseError {
                path: config_path.clone(),
                source,
            })?;

        if let Some(env_name) = env {
            self.apply_environment_overlay(&mut doc, env_name)?;
        }

        let table = scalar_field_table(&serde_json::to_value(&doc).unwrap_or_default());

        let cache_folder = doc
            .cache_folder
            .clone()
            .filter(|s| !s.is_empty())
            .map_or_else(
                || project_root.join(".antelope").join("cache"),
                |s| resolve_relative(project_root, &s),
            );

        let mut modules = HashMap::new();
        for (id, raw_entry) in std::mem::take(&mut doc.modules) {
            let module_id = ModuleId::new(id.clone());
            let mut resolved = self.resolve_module_entry(&id, raw_entry)?;
            interpolate(&mut resolved.config, &table);
            self.merge_sidecar(project_root, &id, &mut resolved)?;
            modules.insert(module_id, resolved);
        }

        Ok(ResolvedProjectConfig {
            name: doc.name,
            cache_folder,
            modules,
        })
    }

    fn apply_environment_overlay(&self, doc: &mut RawProjectConfig, env_name: &str) -> Result<()> {
        let overlay = doc
            .environments
            .get(env_name)
            .cloned()
            .ok_or_else(|| Error::ConfigSemanticError {
                reason: format!("unknown environment '{env_name}'"),
            })?;

        let mut whole = serde_json::to_value(&*doc).unwrap_or_default();
        merge_right_wins(&mut whole, &overlay);
        *doc = serde_json::from_value(whole).map_err(|source| Error::ConfigParseError {
            path: PathBuf::from("<environment overlay>"),
            source,
        })?;
        debug!(environment = env_name, "applied environment overlay");
        Ok(())
    }

    fn resolve_module_entry(
        &self,
        module_id: &str,
        raw: RawModuleEntry,
    ) -> Result<ResolvedModuleEntry> {
        match raw {
            RawModuleEntry::Shorthand(s) => Ok(ResolvedModuleEntry {
                source: shorthand::expand(module_id, &s)?,
                config: serde_json::Value::Null,
                import_overrides: Vec::new(),
                disabled_exports: Vec::new(),
            }),
            RawModuleEntry::Full(doc) => {
                let import_overrides = doc
                    .import_overrides
                    .into_iter()
                    .map(resolve_import_override)
                    .collect::<Result<Vec<_>>>()?;
                Ok(ResolvedModuleEntry {
                    source: doc.source,
                    config: doc.config.unwrap_or(serde_json::Value::Null),
                    import_overrides,
                    disabled_exports: doc.disabled_exports,
                })
            }
        }
    }

    fn merge_sidecar(
        &self,
        project_root: &Path,
        module_id: &str,
        resolved: &mut ResolvedModuleEntry,
    ) -> Result<()> {
        let sidecar_path = project_root.join(format!("antelope.{module_id}.json"));
        if !sidecar_path.exists() {
            return Ok(());
        }
        let text = std::fs::read_to_string(&sidecar_path)?;
        let overlay: serde_json::Value =
            serde_json::from_str(&text).map_err(|source| Error::ConfigParseError {
                path: sidecar_path.clone(),
                source,
            })?;

        if resolved.config.is_null() {
            resolved.config = serde_json::Value::Object(serde_json::Map::new());
        }
        merge_right_wins(&mut resolved.config, &overlay);
        debug!(module = module_id, path = %sidecar_path.display(), "merged module side-car config");
        Ok(())
    }
}

fn resolve_import_override(raw: RawImportOverride) -> Result<ResolvedImportOverride> {
    let interface = InterfaceRef::parse(&raw.interface).ok_or_else(|| Error::ConfigSemanticError {
        reason: format!("invalid interface reference '{}' in importOverrides", raw.interface),
    })?;
    Ok(ResolvedImportOverride {
        interface,
        provider_module_id: ModuleId::new(raw.source),
        provider_export_id: raw.id,
    })
}

fn resolve_relative(project_root: &Path, raw: &str) -> PathBuf {
    let p = Path::new(raw);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        project_root.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, contents: &str) {
        let mut f = std::fs::File::create(dir.join(DEFAULT_CONFIG_NAME)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigResolver::new().resolve(dir.path(), None, None).unwrap_err();
        assert!(matches!(err, Error::ConfigMissing { .. }));
    }

    #[test]
    fn defaults_cache_folder_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), r#"{"name": "app", "modules": {}}"#);
        let resolved = ConfigResolver::new().resolve(dir.path(), None, None).unwrap();
        assert_eq!(resolved.cache_folder, dir.path().join(".antelope").join("cache"));
    }

    #[test]
    fn expands_shorthand_and_full_entries() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"{
                "name": "app",
                "modules": {
                    "db": "^1.0",
                    "api": {
                        "source": {"type": "local", "path": "/m/api"},
                        "importOverrides": [{"interface": "db@1", "source": "db"}]
                    }
                }
            }"#,
        );
        let resolved = ConfigResolver::new().resolve(dir.path(), None, None).unwrap();
        assert_eq!(resolved.modules.len(), 2);
        let api = &resolved.modules[&ModuleId::new("api")];
        assert_eq!(api.import_overrides.len(), 1);
        assert_eq!(api.import_overrides[0].interface, InterfaceRef::new("db", "1"));
    }

    #[test]
    fn interpolates_template_against_top_level_fields() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"{
                "name": "app",
                "env": "prod",
                "modules": {
                    "api": {
                        "source": {"type": "local", "path": "/m/api"},
                        "config": {"label": "${name}-${env}"}
                    }
                }
            }"#,
        );
        let resolved = ConfigResolver::new().resolve(dir.path(), None, None).unwrap();
        let api = &resolved.modules[&ModuleId::new("api")];
        assert_eq!(api.config["label"], "app-prod");
    }

    #[test]
    fn unknown_environment_is_a_semantic_error() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), r#"{"name": "app", "modules": {}}"#);
        let err = ConfigResolver::new()
            .resolve(dir.path(), Some("staging"), None)
            .unwrap_err();
        assert!(matches!(err, Error::ConfigSemanticError { .. }));
    }

    #[test]
    fn environment_overlay_merges_right_wins_at_leaf() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"{
                "name": "app",
                "modules": {
                    "api": {"source": {"type": "local", "path": "/m/api"}, "config": {"debug": false, "port": 8080}}
                },
                "environments": {
                    "prod": {"modules": {"api": {"config": {"debug": true}}}}
                }
            }"#,
        );
        let resolved = ConfigResolver::new()
            .resolve(dir.path(), Some("prod"), None)
            .unwrap();
        let api = &resolved.modules[&ModuleId::new("api")];
        assert_eq!(api.config["debug"], true);
        assert_eq!(api.config["port"], 8080);
    }

    #[test]
    fn sidecar_file_merges_into_module_config() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"{"name": "app", "modules": {"api": {"source": {"type": "local", "path": "/m/api"}, "config": {"a": 1}}}}"#,
        );
        std::fs::write(dir.path().join("antelope.api.json"), r#"{"b": 2}"#).unwrap();
        let resolved = ConfigResolver::new().resolve(dir.path(), None, None).unwrap();
        let api = &resolved.modules[&ModuleId::new("api")];
        assert_eq!(api.config["a"], 1);
        assert_eq!(api.config["b"], 2);
    }

    #[test]
    fn idempotent_on_repeated_resolution() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), r#"{"name": "app", "modules": {"db": "^1.0"}}"#);
        let a = ConfigResolver::new().resolve(dir.path(), None, None).unwrap();
        let b = ConfigResolver::new().resolve(dir.path(), None, None).unwrap();
        assert_eq!(a, b);
    }
}
