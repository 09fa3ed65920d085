//! Hot-reload orchestration for the AntelopeJS runtime (spec §4.9).

mod closure;
mod debounce;
mod hot_reload;
mod reloader;

pub use closure::{induced_plan, strict_consumer_closure};
pub use debounce::{next_batch, DEFAULT_DEBOUNCE_WINDOW};
pub use hot_reload::HotReload;
pub use reloader::ManifestReloader;
