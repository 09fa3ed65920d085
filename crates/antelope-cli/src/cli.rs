//! Argument parsing (spec §6 "Environment toggles" + Scheduler API surface).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "antelopejs", about = "Launch and build AntelopeJS projects", version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all but error-level logs.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve, fetch, plan, and start every module in a project.
    Launch(LaunchArgs),
    /// Resolve and fetch every module, saving the result without starting anything.
    Build(ProjectArgs),
    /// Launch from a previously saved build artifact, skipping resolution.
    LaunchFromBuild(LaunchArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ProjectArgs {
    /// Project root directory.
    #[arg(default_value = ".")]
    pub project_root: PathBuf,

    /// Named environment overlay to apply.
    #[arg(long)]
    pub env: Option<String>,

    /// Explicit path to the project configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bound on simultaneous lifecycle transitions.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Module served for unresolved optional imports.
    #[arg(long)]
    pub stub_module_path: Option<PathBuf>,

    /// Inspector host:port, passed through unexamined.
    #[arg(long)]
    pub inspector: Option<String>,

    /// Channel to include in verbose logging; may be repeated.
    #[arg(long = "verbose-channel")]
    pub verbose_channels: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct LaunchArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Keep watching sources and hot-reload on change.
    #[arg(long)]
    pub watch: bool,
}

impl ProjectArgs {
    #[must_use]
    pub fn to_options(&self, watch: bool) -> antelope_runtime::LaunchOptions {
        antelope_runtime::LaunchOptions {
            env: self.env.clone(),
            config_path: self.config.clone(),
            watch,
            concurrency: self.concurrency,
            stub_module_path: self.stub_module_path.clone(),
            inspector: self.inspector.clone(),
            verbose_channels: self.verbose_channels.clone(),
        }
    }
}
