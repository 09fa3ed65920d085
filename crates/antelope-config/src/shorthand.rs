//! Shorthand module entry expansion (spec §4.1: "bare version string ->
//! `package` source with that version, plain string -> local path with
//! heuristic").

use antelope_core::{Error, ModuleSource};
use once_cell::sync::Lazy;
use regex::Regex;

/// A bare version-ish token: optional range operator followed by digits and
/// dots (`1`, `^1.2`, `~2.0.0`, `>=1.0 <2.0`). Anything else is treated as a
/// filesystem path.
static VERSION_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\^~>=< ]*\d+(\.\d+)*([\.\- ,|][\^~>=< ]*\d+(\.\d+)*)*$").unwrap());

pub fn expand(module_id: &str, shorthand: &str) -> Result<ModuleSource, Error> {
    if shorthand.trim().is_empty() {
        return Err(Error::ConfigSemanticError {
            reason: format!("module '{module_id}' has an empty shorthand entry"),
        });
    }

    if VERSION_LIKE.is_match(shorthand.trim()) {
        Ok(ModuleSource::Package {
            name: module_id.to_string(),
            version: shorthand.trim().to_string(),
            watch_dir: None,
        })
    } else {
        Ok(ModuleSource::Local {
            path: shorthand.trim().into(),
            watch_dir: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_version_becomes_package_source() {
        let source = expand("db", "^1.2.0").unwrap();
        assert!(matches!(source, ModuleSource::Package { version, .. } if version == "^1.2.0"));
    }

    #[test]
    fn plain_string_becomes_local_source() {
        let source = expand("api", "../modules/api").unwrap();
        assert!(matches!(source, ModuleSource::Local { .. }));
    }

    #[test]
    fn empty_string_is_semantic_error() {
        assert!(expand("api", "").is_err());
        assert!(expand("api", "   ").is_err());
    }
}
