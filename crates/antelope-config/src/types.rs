//! Raw and resolved project-configuration document shapes (spec §6).

use antelope_core::{InterfaceRef, ModuleId, ModuleSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// A module entry as written in the project config: either a shorthand
/// string or the full object form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawModuleEntry {
    Shorthand(String),
    Full(RawModuleEntryDoc),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModuleEntryDoc {
    pub source: ModuleSource,
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub import_overrides: Vec<RawImportOverride>,
    #[serde(default)]
    pub disabled_exports: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawImportOverride {
    pub interface: String,
    pub source: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// The raw project configuration document, as parsed from JSON, before
/// shorthand expansion, interpolation, or side-car merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProjectConfig {
    pub name: String,
    #[serde(default)]
    pub cache_folder: Option<String>,
    #[serde(default)]
    pub modules: HashMap<String, RawModuleEntry>,
    #[serde(default)]
    pub environments: HashMap<String, Value>,
    #[serde(default)]
    pub logging: Option<Value>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// A fully-resolved per-module entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModuleEntry {
    pub source: ModuleSource,
    pub config: Value,
    pub import_overrides: Vec<ResolvedImportOverride>,
    pub disabled_exports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImportOverride {
    pub interface: InterfaceRef,
    pub provider_module_id: ModuleId,
    pub provider_export_id: Option<String>,
}

/// The fully-resolved project configuration (spec §6).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProjectConfig {
    pub name: String,
    pub cache_folder: PathBuf,
    pub modules: HashMap<ModuleId, ResolvedModuleEntry>,
}
