//! `WatchEngine` (spec §4.8): hashes and watches each module's declared
//! source directories, emitting a `ModuleChanged` event when a file's
//! content actually changes.

mod engine;

pub use engine::{ModuleChanged, WatchEngine};
