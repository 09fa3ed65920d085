use std::any::Any;
use std::sync::{Arc, OnceLock};

pub type AnyArc = Arc<dyn Any + Send + Sync>;
pub type Factory = Arc<dyn Fn() -> AnyArc + Send + Sync>;

/// How a registered type is produced on lookup.
pub enum Registration {
    /// `register`: a fresh instance on every lookup.
    Transient(Factory),
    /// `registerSingleton`: built on first lookup, then memoized.
    Singleton { factory: Factory, cell: OnceLock<AnyArc> },
    /// `registerInstance`: a literal value, handed out as-is.
    Instance(AnyArc),
}

impl Registration {
    pub fn resolve(&self) -> AnyArc {
        match self {
            Registration::Transient(factory) => factory(),
            Registration::Singleton { factory, cell } => cell.get_or_init(|| factory()).clone(),
            Registration::Instance(value) => value.clone(),
        }
    }
}
