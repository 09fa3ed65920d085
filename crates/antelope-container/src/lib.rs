//! A minimal, type-keyed dependency-injection container (spec §4.10).
//!
//! This exists purely so tests can substitute collaborators — a fake
//! `FileSystem`, an in-memory `SourceRegistry`, a no-op `WatchEngine` — for
//! their real implementations, not to run the production wiring. It is
//! deliberately smaller than a full DI framework: no constructor injection,
//! no multi-binding, no disposer ordering. One registration per type, per
//! scope.

mod container;
mod registration;

pub use container::Container;
