//! The `ModuleManifest` data model (spec §3).

use crate::ids::{InterfaceRef, ModuleId};
use crate::version::VersionSpec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tagged variant describing where a module comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ModuleSource {
    Package {
        name: String,
        version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        watch_dir: Option<WatchDir>,
    },
    Git {
        remote: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        commit: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        watch_dir: Option<WatchDir>,
    },
    Local {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        watch_dir: Option<WatchDir>,
    },
    #[serde(rename = "local-folder")]
    LocalFolder {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        watch_dir: Option<WatchDir>,
    },
}

impl ModuleSource {
    #[must_use]
    pub fn watch_dir(&self) -> Option<&WatchDir> {
        match self {
            Self::Package { watch_dir, .. }
            | Self::Git { watch_dir, .. }
            | Self::Local { watch_dir, .. }
            | Self::LocalFolder { watch_dir, .. } => watch_dir.as_ref(),
        }
    }

    /// Whether this source is watched by default when `watch_dir` is absent
    /// (spec §3: "the module root is watched when `local*`, and no watching
    /// is performed otherwise").
    #[must_use]
    pub const fn watches_by_default(&self) -> bool {
        matches!(self, Self::Local { .. } | Self::LocalFolder { .. })
    }
}

/// Either a single relative path or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WatchDir {
    Single(String),
    Many(Vec<String>),
}

impl WatchDir {
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        match self {
            Self::Single(p) => vec![p.clone()],
            Self::Many(ps) => ps.clone(),
        }
    }
}

/// Descriptor published through a module's `exportsPath`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDescriptor {
    pub interface: InterfaceRef,
    pub range: VersionSpec,
}

/// A `{alias, replace}` pair for intra-module path mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrcAlias {
    pub alias: String,
    pub replace: PathBuf,
}

/// Per-consumer redirect overriding the default "unique provider" rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOverride {
    pub interface: InterfaceRef,
    pub provider_module_id: ModuleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_export_id: Option<String>,
}

/// The materialized form of a module after the source registry has fetched
/// it (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub id: ModuleId,
    pub name: String,
    pub version: semver::Version,
    pub folder: PathBuf,
    pub main_entry: PathBuf,
    pub exports_path: PathBuf,
    pub exports: Vec<ExportDescriptor>,
    /// Strict imports.
    pub imports: Vec<InterfaceRef>,
    /// Optional imports (spec §4.4: resolved as "optional-unresolved"
    /// rather than "missing" when no provider exists).
    #[serde(default)]
    pub optional_imports: Vec<InterfaceRef>,
    #[serde(default)]
    pub src_aliases: Vec<SrcAlias>,
    #[serde(default)]
    pub watch_dir: Option<WatchDir>,
    pub source: ModuleSource,
}

impl ModuleManifest {
    /// Re-read manifest metadata from disk without re-fetching, so
    /// post-edit watch cycles pick up changes to `exports`/`imports`
    /// (spec §3, §4.3).
    ///
    /// Callers supply the freshly-read manifest (produced by re-running the
    /// same source-registry parsing logic that created this one); this
    /// keeps the reload path free of registry-specific parsing knowledge.
    pub fn reload_from(&mut self, fresh: ModuleManifest) {
        debug_assert_eq!(self.id, fresh.id);
        self.name = fresh.name;
        self.version = fresh.version;
        self.main_entry = fresh.main_entry;
        self.exports_path = fresh.exports_path;
        self.exports = fresh.exports;
        self.imports = fresh.imports;
        self.optional_imports = fresh.optional_imports;
        self.src_aliases = fresh.src_aliases;
        self.watch_dir = fresh.watch_dir;
    }

    /// Directories to watch, resolved against `folder` (spec §3 / SPEC_FULL §3).
    #[must_use]
    pub fn resolved_watch_dirs(&self) -> Vec<PathBuf> {
        let entries = self
            .watch_dir
            .as_ref()
            .map(WatchDir::paths)
            .unwrap_or_default();
        if entries.is_empty() {
            if self.source.watches_by_default() {
                return vec![self.folder.clone()];
            }
            return Vec::new();
        }
        entries.into_iter().map(|p| self.folder.join(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> ModuleManifest {
        ModuleManifest {
            id: ModuleId::new("api"),
            name: "api".into(),
            version: semver::Version::new(1, 0, 0),
            folder: PathBuf::from("/m/api"),
            main_entry: PathBuf::from("/m/api/index.js"),
            exports_path: PathBuf::from("/m/api/.exports"),
            exports: Vec::new(),
            imports: vec![InterfaceRef::new("db", "1")],
            optional_imports: Vec::new(),
            src_aliases: Vec::new(),
            watch_dir: None,
            source: ModuleSource::Local {
                path: PathBuf::from("/m/api"),
                watch_dir: None,
            },
        }
    }

    #[test]
    fn local_source_watches_root_by_default() {
        let m = manifest();
        assert_eq!(m.resolved_watch_dirs(), vec![PathBuf::from("/m/api")]);
    }

    #[test]
    fn explicit_watch_dir_is_joined_against_folder() {
        let mut m = manifest();
        m.watch_dir = Some(WatchDir::Many(vec!["src".into(), "lib".into()]));
        assert_eq!(
            m.resolved_watch_dirs(),
            vec![PathBuf::from("/m/api/src"), PathBuf::from("/m/api/lib")]
        );
    }

    #[test]
    fn package_source_does_not_watch_by_default() {
        let mut m = manifest();
        m.source = ModuleSource::Package {
            name: "api".into(),
            version: "1.0.0".into(),
            watch_dir: None,
        };
        assert!(m.resolved_watch_dirs().is_empty());
    }
}
