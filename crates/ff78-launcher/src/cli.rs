//! CLI argument definitions for FF78Launcher.

use std::path::PathBuf;

use clap::Parser;
use ff78_core::config::{CONFIG_FILE, LOG_FILE};

#[derive(Parser)]
#[command(name = "FF78Launcher")]
#[command(about = "Launcher for FINAL FANTASY VII and VIII", version)]
pub struct Args {
    /// Directory containing the game executable
    #[arg(long, value_name = "DIR", default_value = ".", env = "FF78_GAME_DIR")]
    pub game_dir: PathBuf,

    /// Path to config file (default: FF78Launcher.toml in the game directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to log file (default: FF78Launcher.log in the game directory)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log to stderr instead of the log file
    #[arg(long)]
    pub log_stderr: bool,
}

impl Args {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.game_dir.join(CONFIG_FILE))
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.game_dir.join(LOG_FILE))
    }
}
