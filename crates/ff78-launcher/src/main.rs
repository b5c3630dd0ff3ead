#![cfg_attr(
    all(target_os = "windows", not(debug_assertions)),
    windows_subsystem = "windows"
)]

mod cli;
mod platform;

use std::fs::File;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use ff78_core::LaunchContext;
use ff78_core::config::APP_NAME;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;
    platform::install_crash_handler();

    info!("{} {} starting", APP_NAME, env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        platform::report_launch_failure();
        return Err(e);
    }
    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    // RUST_LOG overrides the default
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("FF78Launcher=info,ff78_core=info"));

    if args.log_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        let path = args.log_path();
        let file = File::create(&path)
            .with_context(|| format!("Failed to create log file {:?}", path))?;
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config_path = args.config_path();
    let ctx = LaunchContext::detect(&args.game_dir, &config_path)
        .with_context(|| format!("Failed to prepare the game in {:?}", args.game_dir))?;

    let outcome = ff78_core::launch(&ctx).context("Failed to launch the game")?;
    info!(
        "Game exited (pid {}, exit code {:?}, {} messages sent, {} received)",
        outcome.pid, outcome.exit_code, outcome.messages_sent, outcome.messages_received
    );
    Ok(())
}
