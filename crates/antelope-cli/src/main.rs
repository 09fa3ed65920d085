//! Thin CLI front-end over `antelope-runtime` (spec §6: "Scheduler API
//! surface" / "Exit codes"). Owns no orchestration logic of its own.

mod cli;

use cli::{Cli, Command, LaunchArgs, ProjectArgs};
use clap::Parser;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder().with_default_directive(log_level.into()).from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).without_time().init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create runtime");

    match runtime.block_on(run(cli.command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Launch(args) => launch_and_wait(args).await,
        Command::Build(args) => build_only(&args).await,
        Command::LaunchFromBuild(args) => launch_from_build_and_wait(args).await,
    }
}

async fn launch_and_wait(args: LaunchArgs) -> anyhow::Result<()> {
    let options = args.project.to_options(args.watch);
    let mut manager = antelope_runtime::launch(&args.project.project_root, options).await?;
    info!("project launched");
    if args.watch {
        wait_for_shutdown().await;
        manager.stop_watching();
        manager.stop_all().await;
        manager.destroy_all().await;
    }
    Ok(())
}

async fn launch_from_build_and_wait(args: LaunchArgs) -> anyhow::Result<()> {
    let options = args.project.to_options(args.watch);
    let mut manager = antelope_runtime::launch_from_build(&args.project.project_root, options).await?;
    info!("project launched from build artifact");
    if args.watch {
        wait_for_shutdown().await;
        manager.stop_watching();
        manager.stop_all().await;
        manager.destroy_all().await;
    }
    Ok(())
}

async fn build_only(args: &ProjectArgs) -> anyhow::Result<()> {
    let options = args.to_options(false);
    let artifact = antelope_runtime::build(&args.project_root, options).await?;
    info!(
        modules = artifact.manifests.len(),
        skipped = artifact.skipped.len(),
        "build artifact saved"
    );
    for diagnostic in &artifact.skipped {
        tracing::warn!(module = %diagnostic.module, reason = %diagnostic.reason, "module skipped during build");
    }
    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal, exiting immediately");
    }
}
