//! Error taxonomy for the AntelopeJS runtime.
//!
//! Every error carries an [`ErrorCode`] (grouped by the component that
//! raised it, e.g. `AJS01xx` for config errors) and, where applicable, the
//! [`ModuleId`] it pertains to, matching spec §7's "every error carries the
//! `ModuleId` it pertains to" rule.

use crate::ids::ModuleId;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Stable error codes, grouped by the component that raises them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Config errors (AJS01xx)
    ConfigMissing,
    ConfigParseError,
    ConfigSemanticError,

    // Cache errors (AJS02xx)
    CacheCorrupt,
    CacheIo,

    // Source-fetch errors (AJS03xx)
    SourceFetchError,

    // Planner errors (AJS04xx)
    MissingProvider,
    AmbiguousProvider,
    ImportCycle,

    // Lifecycle errors (AJS05xx)
    LifecycleFailure,

    // Path-resolution errors (AJS06xx)
    UnimportedInterface,

    // Watch errors (AJS07xx)
    WatchError,

    // Reload errors (AJS08xx)
    ReloadFailure,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigMissing => "AJS0101",
            Self::ConfigParseError => "AJS0102",
            Self::ConfigSemanticError => "AJS0103",
            Self::CacheCorrupt => "AJS0201",
            Self::CacheIo => "AJS0202",
            Self::SourceFetchError => "AJS0301",
            Self::MissingProvider => "AJS0401",
            Self::AmbiguousProvider => "AJS0402",
            Self::ImportCycle => "AJS0403",
            Self::LifecycleFailure => "AJS0501",
            Self::UnimportedInterface => "AJS0601",
            Self::WatchError => "AJS0701",
            Self::ReloadFailure => "AJS0801",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The runtime's unified error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("[{code}] no project configuration found at {path}", code = ErrorCode::ConfigMissing)]
    ConfigMissing { path: PathBuf },

    #[error("[{code}] failed to parse project configuration at {path}: {source}", code = ErrorCode::ConfigParseError)]
    ConfigParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("[{code}] invalid project configuration: {reason}", code = ErrorCode::ConfigSemanticError)]
    ConfigSemanticError { reason: String },

    #[error("[{code}] module cache is corrupt for {module}: {reason}", code = ErrorCode::CacheCorrupt)]
    CacheCorrupt { module: ModuleId, reason: String },

    #[error("[{code}] cache I/O error for {module}: {source}", code = ErrorCode::CacheIo)]
    CacheIo {
        module: ModuleId,
        #[source]
        source: std::io::Error,
    },

    #[error("[{code}] failed to fetch module {module} from source: {reason}", code = ErrorCode::SourceFetchError)]
    SourceFetchError { module: ModuleId, reason: String },

    #[error(
        "[{code}] interface {interface} required by {consumer} has no provider",
        code = ErrorCode::MissingProvider
    )]
    MissingProvider { consumer: ModuleId, interface: String },

    #[error(
        "[{code}] interface {interface} required by {consumer} is provided by more than one module: {candidates:?}",
        code = ErrorCode::AmbiguousProvider
    )]
    AmbiguousProvider {
        consumer: ModuleId,
        interface: String,
        candidates: Vec<ModuleId>,
    },

    #[error("[{code}] strict import cycle detected: {cycle:?}", code = ErrorCode::ImportCycle)]
    ImportCycle { cycle: Vec<ModuleId> },

    #[error("[{code}] lifecycle transition failed for {module} ({transition}): {reason}", code = ErrorCode::LifecycleFailure)]
    LifecycleFailure {
        module: ModuleId,
        transition: &'static str,
        reason: String,
    },

    #[error(
        "[{code}] module {consumer} requested unimported interface {request}",
        code = ErrorCode::UnimportedInterface
    )]
    UnimportedInterface { consumer: ModuleId, request: String },

    #[error("[{code}] watch error for {module}: {reason}", code = ErrorCode::WatchError)]
    WatchError { module: ModuleId, reason: String },

    #[error("[{code}] reload failed for {module}: {reason}", code = ErrorCode::ReloadFailure)]
    ReloadFailure { module: ModuleId, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The `ModuleId` this error pertains to, if any (spec §7).
    #[must_use]
    pub fn module(&self) -> Option<&ModuleId> {
        match self {
            Self::CacheCorrupt { module, .. }
            | Self::CacheIo { module, .. }
            | Self::SourceFetchError { module, .. }
            | Self::LifecycleFailure { module, .. }
            | Self::WatchError { module, .. }
            | Self::ReloadFailure { module, .. } => Some(module),
            Self::MissingProvider { consumer, .. }
            | Self::AmbiguousProvider { consumer, .. }
            | Self::UnimportedInterface { consumer, .. } => Some(consumer),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
