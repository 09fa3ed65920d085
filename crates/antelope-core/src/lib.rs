//! Core types shared by every component of the AntelopeJS runtime.
//!
//! This crate provides foundational types used throughout the runtime:
//! - Module and interface identifiers
//! - Lifecycle state
//! - The `ModuleManifest` data model
//! - Version specs used by exports/imports
//! - Content hashing
//! - The error taxonomy

pub mod error;
pub mod hash;
pub mod ids;
pub mod lifecycle;
pub mod manifest;
pub mod version;

pub use error::{Error, ErrorCode, Result};
pub use hash::ContentHash;
pub use ids::{InterfaceRef, ModuleId};
pub use lifecycle::LifecycleState;
pub use manifest::{ExportDescriptor, ImportOverride, ModuleManifest, ModuleSource, SrcAlias};
pub use version::VersionSpec;

// Re-export commonly used concurrent-collection types so downstream crates
// depend on one blessed version of each.
pub use ahash::{AHashMap, AHashSet};
pub use dashmap::DashMap;
pub use parking_lot::{Mutex, RwLock};

/// Global allocator for the whole workspace.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
