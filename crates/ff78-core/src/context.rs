//! Everything the launcher knows about the game it is starting.
//!
//! Built once at startup and passed by reference to every component.

use std::path::{self, Path, PathBuf};

use tracing::info;

use crate::config::LauncherConfig;
use crate::edition::{self, DetectedGame, Edition};
use crate::error::Result;
use crate::layout::FieldTable;

#[derive(Debug, Clone)]
pub struct LaunchContext {
    pub edition: Edition,
    pub lang: String,
    pub uses_ffnx: bool,
    pub config: LauncherConfig,
    pub game_dir: PathBuf,
    /// File name of the executable to start (the Chocobo mini-game when configured)
    pub executable: String,
}

impl LaunchContext {
    pub fn new(game: DetectedGame, config: LauncherConfig, game_dir: &Path) -> Self {
        let executable = if config.launch_chocobo {
            game.chocobo_executable()
        } else {
            game.executable
        };
        Self {
            edition: game.edition,
            lang: game.lang,
            uses_ffnx: game.uses_ffnx,
            config,
            game_dir: game_dir.to_path_buf(),
            executable,
        }
    }

    /// Detect the game in `game_dir` and load its section of `config_path`
    pub fn detect(game_dir: &Path, config_path: &Path) -> Result<Self> {
        let game_dir = path::absolute(game_dir)?;
        let game = edition::detect(&game_dir)?;
        info!(
            "Detected {} ({}, lang {}, FFNx: {})",
            game.edition, game.executable, game.lang, game.uses_ffnx
        );
        let config = LauncherConfig::load(config_path, game.edition)?;
        info!("config: {:?}", config);
        Ok(Self::new(game, config, &game_dir))
    }

    /// Prefix of the shared memory and semaphore names
    pub fn channel_prefix(&self) -> &'static str {
        if self.config.launch_chocobo {
            "choco"
        } else {
            self.edition.short_name()
        }
    }

    /// FFNx drives the game itself, except for the Chocobo mini-game
    pub fn needs_channel(&self) -> bool {
        !self.uses_ffnx || self.config.launch_chocobo
    }

    /// The stock driver reads its settings from the legacy `.cfg` files
    pub fn needs_settings_files(&self) -> bool {
        !self.uses_ffnx
    }

    pub fn field_table(&self) -> FieldTable {
        FieldTable::for_edition(self.edition)
    }

    pub fn executable_path(&self) -> PathBuf {
        self.game_dir.join(&self.executable)
    }
}
