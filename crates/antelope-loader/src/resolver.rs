//! `PathResolver` (spec §4.6): translates `@ajs*` module-resolution
//! requests a module's own code makes into real on-disk paths.

use antelope_core::{Error, InterfaceRef, ModuleId, Result};
use dashmap::DashMap;
use std::path::{Path, PathBuf};

const LOCAL_PREFIX: &str = "@ajs.local/";
const INTERFACE_PREFIX: &str = "@ajs/";
const RAW_PREFIX: &str = "@ajs.raw/";

/// A module folder plus the metadata `PathResolver` needs: where its
/// exports live, and its intra-module aliases.
#[derive(Debug, Clone)]
struct ModuleEntry {
    folder: PathBuf,
    exports_path: PathBuf,
    src_aliases: Vec<antelope_core::SrcAlias>,
    optional_imports: Vec<InterfaceRef>,
}

/// Where a consumer's `@ajs/<name>/<ver>` import currently resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub provider: ModuleId,
}

/// Resolves `@ajs.local/`, `@ajs/`, `@ajs.raw/`, and `srcAlias` requests
/// made by a module's own code, given the caller's source path.
///
/// Resolution depends only on the registered folder map and each
/// consumer's current associations (spec §4.6 determinism invariant); no
/// state is mutated by a `resolve` call itself.
#[derive(Debug)]
pub struct PathResolver {
    modules: DashMap<ModuleId, ModuleEntry>,
    associations: DashMap<ModuleId, DashMap<InterfaceRef, Association>>,
    stub_module_path: Option<PathBuf>,
}

impl PathResolver {
    #[must_use]
    pub fn new(stub_module_path: Option<PathBuf>) -> Self {
        Self {
            modules: DashMap::new(),
            associations: DashMap::new(),
            stub_module_path,
        }
    }

    /// Registers a module's folder so future callers under it can be
    /// identified. Called once the module has been transferred into place.
    pub fn register_module(
        &self,
        id: &ModuleId,
        folder: PathBuf,
        exports_path: PathBuf,
        src_aliases: Vec<antelope_core::SrcAlias>,
        optional_imports: Vec<InterfaceRef>,
    ) {
        self.modules.insert(
            id.clone(),
            ModuleEntry {
                folder,
                exports_path,
                src_aliases,
                optional_imports,
            },
        );
        self.associations.entry(id.clone()).or_insert_with(DashMap::new);
    }

    /// Removes a module's folder and associations (spec §4.9: cleared
    /// before `destroy` as part of a hot-reload closure).
    pub fn unregister_module(&self, id: &ModuleId) {
        self.modules.remove(id);
        self.associations.remove(id);
    }

    /// Replaces a consumer's entire associations map, as produced by a
    /// fresh planning run.
    pub fn set_associations(&self, consumer: &ModuleId, associations: impl IntoIterator<Item = (InterfaceRef, Association)>) {
        let map = DashMap::new();
        for (interface, association) in associations {
            map.insert(interface, association);
        }
        self.associations.insert(consumer.clone(), map);
    }

    /// Finds the module whose registered folder is the longest prefix of
    /// `path` (spec §4.6 "caller identification").
    #[must_use]
    pub fn find_caller(&self, path: &Path) -> Option<ModuleId> {
        self.modules
            .iter()
            .filter(|entry| path.starts_with(&entry.value().folder))
            .max_by_key(|entry| entry.value().folder.as_os_str().len())
            .map(|entry| entry.key().clone())
    }

    /// Resolves `request` as seen by the module code at `caller_path`.
    ///
    /// `Ok(None)` means the request is not one of the recognized schemes,
    /// or the caller could not be identified: the host should fall through
    /// to its default resolution. `Err` is returned only when the request
    /// is unambiguously an AntelopeJS request that cannot be satisfied.
    pub fn resolve(&self, caller_path: &Path, request: &str) -> Result<Option<PathBuf>> {
        let Some(caller) = self.find_caller(caller_path) else {
            return Ok(None);
        };

        if let Some(rest) = request.strip_prefix(LOCAL_PREFIX) {
            return self.resolve_local(&caller, rest);
        }
        if let Some(rest) = request.strip_prefix(INTERFACE_PREFIX) {
            return self.resolve_interface(&caller, rest);
        }
        if let Some(rest) = request.strip_prefix(RAW_PREFIX) {
            return self.resolve_raw(rest);
        }
        Ok(self.resolve_alias(&caller, request))
    }

    fn resolve_local(&self, caller: &ModuleId, rest: &str) -> Result<Option<PathBuf>> {
        let Some(entry) = self.modules.get(caller) else {
            return Ok(None);
        };
        Ok(Some(entry.exports_path.join(rest)))
    }

    fn resolve_interface(&self, caller: &ModuleId, rest: &str) -> Result<Option<PathBuf>> {
        let mut parts = rest.splitn(3, '/');
        let (Some(name), Some(version)) = (parts.next(), parts.next()) else {
            return Ok(None);
        };
        let extra = parts.next();
        let interface = InterfaceRef::new(name, version);

        let association = self
            .associations
            .get(caller)
            .and_then(|map| map.get(&interface).map(|a| a.value().clone()));

        let Some(association) = association else {
            let is_optional = self
                .modules
                .get(caller)
                .is_some_and(|entry| entry.optional_imports.contains(&interface));
            if is_optional {
                if let Some(stub) = &self.stub_module_path {
                    return Ok(Some(stub.clone()));
                }
            }
            return Err(Error::UnimportedInterface {
                consumer: caller.clone(),
                request: interface.as_key(),
            });
        };

        let Some(provider) = self.modules.get(&association.provider) else {
            return Ok(None);
        };
        let mut path = provider.exports_path.join(name).join(version);
        if let Some(extra) = extra {
            path = path.join(extra);
        }
        Ok(Some(path))
    }

    fn resolve_raw(&self, rest: &str) -> Result<Option<PathBuf>> {
        let segments: Vec<&str> = rest.split('/').collect();
        let Some(marker) = segments.iter().rposition(|s| s.contains('@')) else {
            return Ok(None);
        };
        if marker == 0 {
            return Ok(None);
        }
        let module_id = ModuleId::new(segments[..marker].join("/"));
        let Some(interface) = InterfaceRef::parse(segments[marker]) else {
            return Ok(None);
        };
        let Some(entry) = self.modules.get(&module_id) else {
            return Ok(None);
        };
        let mut path = entry.exports_path.join(&interface.name).join(&interface.version);
        if marker + 1 < segments.len() {
            path = path.join(segments[marker + 1..].join("/"));
        }
        Ok(Some(path))
    }

    /// The longest matching `srcAlias` prefix wins, so one alias being a
    /// prefix of another (e.g. `@app/` and `@app/internal/`) is still
    /// deterministic.
    fn resolve_alias(&self, caller: &ModuleId, request: &str) -> Option<PathBuf> {
        let entry = self.modules.get(caller)?;
        entry
            .src_aliases
            .iter()
            .filter_map(|alias| {
                request
                    .strip_prefix(alias.alias.as_str())
                    .map(|rest| (alias, rest))
            })
            .max_by_key(|(alias, _)| alias.alias.len())
            .map(|(alias, rest)| alias.replace.join(rest.trim_start_matches('/')))
    }
}
