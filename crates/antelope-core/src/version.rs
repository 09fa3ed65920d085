//! Version specs used by interface exports and imports.
//!
//! Export descriptors carry a range (`VersionSpec`); a consumer's import
//! carries a single token (`InterfaceRef::version`) that must fall inside
//! that range for the provider to be selected (spec §4.4).

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A version range as exported by a module, normalized from a bare token
/// (e.g. `"1"`, `"2.3"`) into a caret-style semver range the way a bare
/// `^1`/`^2.3` would be interpreted, or parsed as-is when it already looks
/// like a semver requirement (`">=1.0, <2.0"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionSpec {
    raw: String,
}

impl VersionSpec {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this range covers the given single-version token.
    #[must_use]
    pub fn covers(&self, token: &str) -> bool {
        if self.raw.trim() == token.trim() {
            return true;
        }
        let Some(version) = parse_loose_version(token) else {
            return false;
        };
        let Some(req) = self.to_semver_req() else {
            return false;
        };
        req.matches(&version)
    }

    fn to_semver_req(&self) -> Option<VersionReq> {
        VersionReq::parse(&normalize(&self.raw)).ok()
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Bare numeric tokens (`"1"`, `"2.3"`) are treated as caret ranges, the
/// common case in the scenario fixtures (`db@1` exported by a provider that
/// also declares `db@1`). Anything that already parses as a `VersionReq` is
/// passed through unchanged.
fn normalize(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() || s == "*" {
        return "*".to_string();
    }
    if VersionReq::parse(s).is_ok() {
        return s.to_string();
    }
    format!("^{}", pad_version(s))
}

fn pad_version(s: &str) -> String {
    let parts: Vec<&str> = s.split('.').collect();
    match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => s.to_string(),
    }
}

/// Parse a single-version token loosely (`"1"` -> `1.0.0`).
#[must_use]
pub fn parse_loose_version(token: &str) -> Option<Version> {
    Version::parse(&pad_version(token.trim())).ok()
}
