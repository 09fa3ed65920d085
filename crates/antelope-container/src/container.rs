use crate::registration::{AnyArc, Factory, Registration};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// A token → factory registry, scoped in a parent/child chain.
///
/// Lookups check this container's own registrations first, falling back to
/// the parent chain. A child created via [`Container::create_scope`] may
/// shadow a parent registration for a given type without mutating the
/// parent.
pub struct Container {
    parent: Option<Arc<Container>>,
    entries: DashMap<TypeId, Registration>,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.entries.len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    #[must_use]
    pub fn new() -> Self {
        Self { parent: None, entries: DashMap::new() }
    }

    /// Registers a factory invoked fresh on every lookup of `T`.
    pub fn register<T>(&self, factory: impl Fn() -> T + Send + Sync + 'static)
    where
        T: Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Arc::new(factory()) as AnyArc);
        self.entries.insert(TypeId::of::<T>(), Registration::Transient(factory));
    }

    /// Registers a factory invoked once, on the first lookup of `T`, and
    /// memoized for every lookup after that.
    pub fn register_singleton<T>(&self, factory: impl Fn() -> T + Send + Sync + 'static)
    where
        T: Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Arc::new(factory()) as AnyArc);
        self.entries.insert(TypeId::of::<T>(), Registration::Singleton { factory, cell: Default::default() });
    }

    /// Registers a literal instance, handed out as-is on every lookup.
    pub fn register_instance<T>(&self, instance: T)
    where
        T: Send + Sync + 'static,
    {
        self.entries.insert(TypeId::of::<T>(), Registration::Instance(Arc::new(instance)));
    }

    /// Looks up `T`, checking this container's own registrations before
    /// falling back to the parent chain. `None` if nothing registered `T`
    /// anywhere along the chain.
    #[must_use]
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        if let Some(reg) = self.entries.get(&TypeId::of::<T>()) {
            return downcast(reg.resolve());
        }
        self.parent.as_ref().and_then(|p| p.get::<T>())
    }

    /// A child scope that inherits this container's registrations and may
    /// shadow them with its own, without mutating this container.
    #[must_use]
    pub fn create_scope(self: &Arc<Self>) -> Arc<Container> {
        Arc::new(Container { parent: Some(self.clone()), entries: DashMap::new() })
    }
}

fn downcast<T: Send + Sync + 'static>(value: AnyArc) -> Option<Arc<T>> {
    let raw: Arc<dyn Any + Send + Sync> = value;
    raw.downcast::<T>().ok()
}
