//! Project configuration resolution (spec §4.1).

mod interpolate;
mod merge;
mod resolver;
mod shorthand;
mod types;

pub use merge::merge_right_wins;
pub use resolver::ConfigResolver;
pub use types::{
    RawImportOverride, RawModuleEntry, RawModuleEntryDoc, RawProjectConfig, ResolvedImportOverride,
    ResolvedModuleEntry, ResolvedProjectConfig,
};
