//! Directories handed to the game.

use std::io;
use std::path::{self, Path, PathBuf};

use crate::edition::Edition;
use crate::error::Result;

/// Present in the game directory of installs that keep their settings locally
pub const LOCAL_SETTINGS_MARKER: &str = "data/music_2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDirs {
    /// Where the `.cfg` files live; sent as the document directory
    pub settings_dir: PathBuf,
    pub user_save_dir: PathBuf,
    pub install_dir: PathBuf,
}

impl GameDirs {
    /// Resolve against the current user's Documents folder.
    ///
    /// A relative `game_dir` is made absolute first; the game runs with its
    /// own working directory and cannot use paths relative to the launcher.
    pub fn resolve(edition: Edition, game_dir: &Path) -> Result<Self> {
        let game_dir = path::absolute(game_dir)?;
        if keeps_settings_locally(edition, &game_dir) {
            return Ok(Self::with_settings_dir(game_dir.clone(), &game_dir));
        }
        let documents = dirs::document_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Documents folder not found")
        })?;
        Ok(Self::resolve_in(edition, &game_dir, &documents))
    }

    /// Resolve with an explicit Documents folder
    pub fn resolve_in(edition: Edition, game_dir: &Path, documents: &Path) -> Self {
        let settings_dir = if keeps_settings_locally(edition, game_dir) {
            game_dir.to_path_buf()
        } else {
            documents.join("Square Enix").join(steam_folder(edition))
        };
        Self::with_settings_dir(settings_dir, game_dir)
    }

    fn with_settings_dir(settings_dir: PathBuf, game_dir: &Path) -> Self {
        Self {
            user_save_dir: settings_dir.join("save"),
            settings_dir,
            install_dir: game_dir.to_path_buf(),
        }
    }
}

fn keeps_settings_locally(edition: Edition, game_dir: &Path) -> bool {
    edition.is_estore() || game_dir.join(LOCAL_SETTINGS_MARKER).exists()
}

fn steam_folder(edition: Edition) -> &'static str {
    match edition {
        Edition::FF7(_) => "FINAL FANTASY VII Steam",
        Edition::FF8 => "FINAL FANTASY VIII Steam",
    }
}

/// Payload of the locale data directory message
pub fn locale_data_dir(lang: &str) -> String {
    format!("lang-{}", lang)
}
