//! Top-level orchestration for the AntelopeJS runtime (spec §6): resolves
//! a project's configuration, fetches and plans its modules, and drives
//! them through their lifecycle — optionally keeping them hot-reloading
//! as their sources change.

mod build;
mod handle;
mod hooks;
mod manager;
mod options;
mod reloader;
mod runtime;

pub use build::{BuildArtifact, BuildDiagnostic, BuiltImportOverride, BuiltModuleEntry};
pub use handle::ModuleHandle;
pub use manager::ModuleManager;
pub use options::LaunchOptions;
pub use reloader::RegistryReloader;
pub use runtime::{build, launch, launch_from_build};
