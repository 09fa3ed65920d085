//! Runtime module-path resolution (spec §4.6) and proxy bookkeeping
//! (spec §4.7) for the AntelopeJS runtime.

mod proxies;
mod resolver;

pub use proxies::ProxyTracker;
pub use resolver::{Association, PathResolver};
