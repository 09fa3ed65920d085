use std::path::PathBuf;

/// Environment toggles threaded through `launch`/`build`/`launchFromBuild`
/// (spec §6: "project path, environment name, watch flag, concurrency
/// bound, inspector host:port, verbose channel list").
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub env: Option<String>,
    pub config_path: Option<PathBuf>,
    /// Whether to install `WatchEngine`/`HotReload` after the initial launch.
    pub watch: bool,
    /// Bound on `LifecycleScheduler`'s per-layer concurrency; `None` uses
    /// its own default.
    pub concurrency: Option<usize>,
    /// Path handed to modules whose optional import has no provider
    /// (spec §4.6/§8 scenario D).
    pub stub_module_path: Option<PathBuf>,
    /// `host:port` for an inspector/debugger, passed through unexamined;
    /// no component in this crate consumes it.
    pub inspector: Option<String>,
    /// Named log channels a verbose external collaborator may subscribe
    /// to; passed through unexamined.
    pub verbose_channels: Vec<String>,
}
