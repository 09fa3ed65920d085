//! The lifecycle hooks a `LifecycleScheduler` drives.
//!
//! Calling into a loaded module's own `construct`/`start`/`stop`/`destroy`
//! code is outside this crate's scope (that's the loaded unit's job); this
//! trait is the seam an embedder provides an implementation for.

use antelope_core::{ModuleId, Result};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait ModuleHooks: Send + Sync {
    async fn construct(&self, id: &ModuleId, config: &Value) -> Result<()>;
    async fn start(&self, id: &ModuleId) -> Result<()>;
    async fn stop(&self, id: &ModuleId) -> Result<()>;
    async fn destroy(&self, id: &ModuleId) -> Result<()>;
}
