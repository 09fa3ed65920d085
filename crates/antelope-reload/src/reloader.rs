//! The seam between `HotReload` and however manifests actually get
//! re-fetched/re-parsed (spec §4.9 step 3: "Invoke `ModuleManifest.reload()`
//! on the root module").

use antelope_core::{ModuleId, ModuleManifest, Result};
use async_trait::async_trait;

#[async_trait]
pub trait ManifestReloader: Send + Sync {
    /// Re-fetch and re-parse `id`'s manifest from its source.
    async fn reload(&self, id: &ModuleId) -> Result<ModuleManifest>;
}
