//! Stable identifiers: `ModuleId` and `InterfaceRef`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable string identifying a module within a running project.
///
/// Assigned by the config resolver; unique within a project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ModuleId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A parsed `name@version` interface reference.
///
/// Two `InterfaceRef`s are equivalent if `name` and `version` strings are
/// equal (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterfaceRef {
    pub name: String,
    pub version: String,
}

impl InterfaceRef {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Parse `name@version`. The last `@` in the string is the split point,
    /// so scoped names containing `@` in a leading segment (e.g.
    /// `@scope/name@1.0`) are handled correctly.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let at = raw.rfind('@')?;
        if at == 0 {
            return None;
        }
        let (name, version) = raw.split_at(at);
        let version = &version[1..];
        if name.is_empty() || version.is_empty() {
            return None;
        }
        Some(Self::new(name, version))
    }

    #[must_use]
    pub fn as_key(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

impl fmt::Display for InterfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
