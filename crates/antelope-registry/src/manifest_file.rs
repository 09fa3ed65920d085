//! On-disk `ajs-module.json` — the module's own description of itself.

use antelope_core::{
    Error, ExportDescriptor, InterfaceRef, ModuleId, ModuleManifest, ModuleSource, Result,
    SrcAlias, VersionSpec,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MANIFEST_FILE_NAME: &str = "ajs-module.json";

#[must_use]
pub fn manifest_file_path(module_root: &Path) -> PathBuf {
    module_root.join(MANIFEST_FILE_NAME)
}

#[must_use]
pub fn has_manifest_file(module_root: &Path) -> bool {
    manifest_file_path(module_root).is_file()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExport {
    interface: String,
    range: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSrcAlias {
    alias: String,
    replace: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAjsModule {
    name: String,
    version: String,
    main_entry: PathBuf,
    exports_path: PathBuf,
    #[serde(default)]
    exports: Vec<RawExport>,
    #[serde(default)]
    imports: Vec<String>,
    #[serde(default)]
    optional_imports: Vec<String>,
    #[serde(default)]
    src_aliases: Vec<RawSrcAlias>,
}

/// Read and parse `<module_root>/ajs-module.json` into a [`ModuleManifest`].
///
/// `folder` and `source` are supplied by the caller (the downloader knows
/// where the module lives and how it was fetched); everything else comes
/// from the file itself.
pub fn read(
    id: &ModuleId,
    module_root: &Path,
    source: ModuleSource,
) -> Result<ModuleManifest> {
    let path = manifest_file_path(module_root);
    let text = std::fs::read_to_string(&path)?;
    let raw: RawAjsModule = serde_json::from_str(&text).map_err(|source| Error::ConfigParseError {
        path: path.clone(),
        source,
    })?;

    let version = semver::Version::parse(&raw.version).map_err(|e| Error::ConfigSemanticError {
        reason: format!("invalid version '{}' in {}: {e}", raw.version, path.display()),
    })?;

    let exports = raw
        .exports
        .into_iter()
        .map(|e| parse_export(&path, e))
        .collect::<Result<Vec<_>>>()?;
    let imports = raw
        .imports
        .iter()
        .map(|s| parse_interface(&path, s))
        .collect::<Result<Vec<_>>>()?;
    let optional_imports = raw
        .optional_imports
        .iter()
        .map(|s| parse_interface(&path, s))
        .collect::<Result<Vec<_>>>()?;
    let src_aliases = raw
        .src_aliases
        .into_iter()
        .map(|a| SrcAlias {
            alias: a.alias,
            replace: a.replace,
        })
        .collect();
    let watch_dir = source.watch_dir().cloned();

    Ok(ModuleManifest {
        id: id.clone(),
        name: raw.name,
        version,
        folder: module_root.to_path_buf(),
        main_entry: module_root.join(raw.main_entry),
        exports_path: module_root.join(raw.exports_path),
        exports,
        imports,
        optional_imports,
        src_aliases,
        watch_dir,
        source,
    })
}

fn parse_export(path: &Path, raw: RawExport) -> Result<ExportDescriptor> {
    Ok(ExportDescriptor {
        interface: parse_interface(path, &raw.interface)?,
        range: VersionSpec::new(raw.range),
    })
}

fn parse_interface(path: &Path, raw: &str) -> Result<InterfaceRef> {
    InterfaceRef::parse(raw).ok_or_else(|| Error::ConfigSemanticError {
        reason: format!("invalid interface reference '{raw}' in {}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_well_formed_manifest_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            manifest_file_path(dir.path()),
            r#"{
                "name": "db",
                "version": "1.2.0",
                "mainEntry": "index.js",
                "exportsPath": ".exports",
                "exports": [{"interface": "db@1", "range": "^1"}],
                "imports": ["logger@1"],
                "optionalImports": ["metrics@1"],
                "srcAliases": [{"alias": "@db", "replace": "src"}]
            }"#,
        )
        .unwrap();

        let source = ModuleSource::Local {
            path: dir.path().to_path_buf(),
            watch_dir: None,
        };
        let manifest = read(&ModuleId::new("db"), dir.path(), source).unwrap();

        assert_eq!(manifest.name, "db");
        assert_eq!(manifest.version, semver::Version::new(1, 2, 0));
        assert_eq!(manifest.main_entry, dir.path().join("index.js"));
        assert_eq!(manifest.exports.len(), 1);
        assert_eq!(manifest.imports, vec![InterfaceRef::new("logger", "1")]);
        assert_eq!(manifest.optional_imports, vec![InterfaceRef::new("metrics", "1")]);
        assert_eq!(manifest.src_aliases.len(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read(
            &ModuleId::new("db"),
            dir.path(),
            ModuleSource::Local {
                path: dir.path().to_path_buf(),
                watch_dir: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
