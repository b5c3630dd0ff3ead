use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::edition::Edition;
use crate::error::{Error, Result};

/// Settings for one game, one `[ff7]` or `[ff8]` table in the config file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub launch_chocobo: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub refresh_rate: u32,
    pub fullscreen: bool,
    pub keep_aspect_ratio: bool,
    pub enable_linear_filtering: bool,
    pub original_mode: bool,
    pub pause_game_on_background: bool,
    pub sfx_volume: u32,
    pub music_volume: u32,
    pub disable_cloud: bool,
    pub game_version: u32,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            launch_chocobo: false,
            window_width: 0,
            window_height: 0,
            refresh_rate: 0,
            fullscreen: true,
            keep_aspect_ratio: false,
            enable_linear_filtering: false,
            original_mode: false,
            pause_game_on_background: false,
            sfx_volume: 100,
            music_volume: 100,
            disable_cloud: true,
            game_version: 1,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    ff7: LauncherConfig,
    ff8: LauncherConfig,
}

impl LauncherConfig {
    /// Load the section for `edition` from a config file.
    ///
    /// A missing file is not an error: defaults are returned.
    pub fn load<P: AsRef<Path>>(path: P, edition: Edition) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content, edition),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Config file {:?} not found, using defaults", path);
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse config content and pick the section for `edition`
    pub fn parse(content: &str, edition: Edition) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let config = match edition {
            Edition::FF7(_) => file.ff7,
            Edition::FF8 => file.ff8,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, volume) in [("sfx_volume", self.sfx_volume), ("music_volume", self.music_volume)] {
            if volume > 100 {
                return Err(Error::ConfigParseError(format!(
                    "{} must be between 0 and 100, got {}",
                    name, volume
                )));
            }
        }
        Ok(())
    }
}
