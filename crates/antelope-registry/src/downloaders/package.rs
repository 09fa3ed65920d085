//! `package` downloader — fetch the tarball of a published package version,
//! verify its checksum when published, extract into the cache, and read its
//! manifest.

use antelope_cache::ModuleCache;
use antelope_core::{Error, ModuleId, ModuleManifest, ModuleSource, Result};
use digest::Digest;
use sha2::Sha256;
use tracing::{debug, warn};

const DEFAULT_REGISTRY_URL: &str = "https://registry.antelopejs.dev";

fn registry_base_url() -> String {
    std::env::var("ANTELOPE_REGISTRY_URL").unwrap_or_else(|_| DEFAULT_REGISTRY_URL.to_string())
}

fn tarball_url(name: &str, version: &str) -> String {
    format!("{}/{name}/-/{name}-{version}.tgz", registry_base_url())
}

pub async fn fetch(
    client: &reqwest::Client,
    cache: &ModuleCache,
    id: &ModuleId,
    name: &str,
    version: &str,
    source: ModuleSource,
) -> Result<Vec<ModuleManifest>> {
    let url = tarball_url(name, version);
    debug!(module = %id, %url, "fetching package tarball");

    let bytes = get(client, &url)
        .await
        .map_err(|reason| Error::SourceFetchError { module: id.clone(), reason })?;

    match get(client, &format!("{url}.sha256")).await {
        Ok(expected) => {
            let expected = String::from_utf8_lossy(&expected).trim().to_lowercase();
            let actual = hex::encode(Sha256::digest(&bytes));
            if expected != actual {
                return Err(Error::SourceFetchError {
                    module: id.clone(),
                    reason: format!("checksum mismatch: expected {expected}, got {actual}"),
                });
            }
        }
        Err(_) => warn!(module = %id, %url, "no published checksum, skipping verification"),
    }

    let staging = cache.get_temp()?;
    let archive_path = staging.path().join(format!("{name}-{version}.tgz"));
    std::fs::write(&archive_path, &bytes)?;

    let extract_dir = staging.path().join("extracted");
    antelope_archive::extract(&archive_path, &extract_dir).map_err(|e| Error::SourceFetchError {
        module: id.clone(),
        reason: e.to_string(),
    })?;

    let parsed_version = semver::Version::parse(version).map_err(|e| Error::ConfigSemanticError {
        reason: format!("invalid package version '{version}': {e}"),
    })?;
    let dest = cache.transfer(&extract_dir, id, parsed_version)?;

    Ok(vec![crate::manifest_file::read(id, &dest, source)?])
}

async fn get(client: &reqwest::Client, url: &str) -> std::result::Result<Vec<u8>, String> {
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;
    let response = response.error_for_status().map_err(|e| e.to_string())?;
    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tarball_url_follows_npm_style_layout() {
        assert_eq!(
            tarball_url("db", "1.2.0"),
            format!("{DEFAULT_REGISTRY_URL}/db/-/db-1.2.0.tgz")
        );
    }
}
