//! `ProxyTracker` (spec §4.7): per-module multi-maps of proxies registered
//! during `construct`, cleared before `destroy`/reload so consumers that
//! cached a reference see a fail-fast error rather than stale state.

use antelope_core::ModuleId;
use dashmap::DashMap;
use serde_json::Value;

/// Opaque handle to whatever a module registered; this crate only tracks
/// ownership and lifetime, never interprets the payload.
pub type ProxyHandle = Value;

#[derive(Debug, Default)]
pub struct ProxyTracker {
    async_proxies: DashMap<ModuleId, Vec<ProxyHandle>>,
    registering_proxies: DashMap<ModuleId, Vec<ProxyHandle>>,
}

impl ProxyTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_async(&self, module: &ModuleId, proxy: ProxyHandle) {
        self.async_proxies.entry(module.clone()).or_default().push(proxy);
    }

    pub fn register_registering(&self, module: &ModuleId, proxy: ProxyHandle) {
        self.registering_proxies.entry(module.clone()).or_default().push(proxy);
    }

    #[must_use]
    pub fn async_proxies(&self, module: &ModuleId) -> Vec<ProxyHandle> {
        self.async_proxies.get(module).map(|v| v.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn registering_proxies(&self, module: &ModuleId) -> Vec<ProxyHandle> {
        self.registering_proxies.get(module).map(|v| v.clone()).unwrap_or_default()
    }

    /// Drops both buckets for `module`. Touches only that module's entries
    /// (spec §4.7 invariant).
    pub fn clear(&self, module: &ModuleId) {
        self.async_proxies.remove(module);
        self.registering_proxies.remove(module);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registered_proxies_are_retrievable_per_module() {
        let tracker = ProxyTracker::new();
        let api = ModuleId::new("api");
        tracker.register_async(&api, json!({"id": 1}));
        tracker.register_async(&api, json!({"id": 2}));

        assert_eq!(tracker.async_proxies(&api).len(), 2);
        assert!(tracker.registering_proxies(&api).is_empty());
    }

    #[test]
    fn clear_only_touches_the_named_module() {
        let tracker = ProxyTracker::new();
        let api = ModuleId::new("api");
        let db = ModuleId::new("db");
        tracker.register_async(&api, json!(1));
        tracker.register_registering(&api, json!(2));
        tracker.register_async(&db, json!(3));

        tracker.clear(&api);

        assert!(tracker.async_proxies(&api).is_empty());
        assert!(tracker.registering_proxies(&api).is_empty());
        assert_eq!(tracker.async_proxies(&db).len(), 1);
    }

    #[test]
    fn unknown_module_returns_empty_vecs() {
        let tracker = ProxyTracker::new();
        assert!(tracker.async_proxies(&ModuleId::new("ghost")).is_empty());
    }
}
