//! Game edition detection.
//!
//! The launcher lives next to exactly one game executable. Which one it is,
//! together with the size of `AF3DN.P`, decides the edition and whether the
//! FFNx driver is installed.

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// Executables the launcher knows how to start
pub const GAME_EXECUTABLES: [&str; 11] = [
    // FF7
    "ff7_de.exe",
    "ff7_en.exe",
    "ff7_es.exe",
    "ff7_fr.exe",
    "ff7_ja.exe",
    // FF8
    "ff8_de.exe",
    "ff8_en.exe",
    "ff8_es.exe",
    "ff8_fr.exe",
    "ff8_it.exe",
    "ff8_ja.exe",
];

/// Graphics driver file. The stock one is small, FFNx replaces it with a large one.
pub const AF3DN_FILE: &str = "AF3DN.P";

/// Size threshold separating the stock driver from FFNx
pub const FFNX_SIZE_THRESHOLD: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Store {
    Standard,
    EStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    FF7(Store),
    FF8,
}

impl Edition {
    pub fn is_ff8(self) -> bool {
        matches!(self, Edition::FF8)
    }

    pub fn is_estore(self) -> bool {
        matches!(self, Edition::FF7(Store::EStore))
    }

    /// Short name used for per-game file names and object prefixes
    pub fn short_name(self) -> &'static str {
        match self {
            Edition::FF7(_) => "ff7",
            Edition::FF8 => "ff8",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edition::FF7(Store::Standard) => write!(f, "FINAL FANTASY VII"),
            Edition::FF7(Store::EStore) => write!(f, "FINAL FANTASY VII (e-store)"),
            Edition::FF8 => write!(f, "FINAL FANTASY VIII"),
        }
    }
}

/// What was found in the game directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedGame {
    pub executable: String,
    pub edition: Edition,
    /// Two-letter language code taken from the executable name
    pub lang: String,
    pub uses_ffnx: bool,
}

impl DetectedGame {
    pub fn chocobo_executable(&self) -> String {
        format!("chocobo_{}.exe", self.lang)
    }
}

/// Detect the game installed in `game_dir`
pub fn detect(game_dir: &Path) -> Result<DetectedGame> {
    let available: Vec<&str> = GAME_EXECUTABLES
        .into_iter()
        .filter(|exe| game_dir.join(exe).is_file())
        .collect();
    debug!("Executables found: {:?}", available);

    let executable = match available.as_slice() {
        [] => return Err(Error::GameNotFound(game_dir.display().to_string())),
        [single] => single.to_string(),
        many => {
            return Err(Error::AmbiguousGame(
                many.iter().map(|s| s.to_string()).collect(),
            ));
        }
    };

    let driver_size = std::fs::metadata(game_dir.join(AF3DN_FILE))
        .ok()
        .map(|metadata| metadata.len());
    let uses_ffnx = driver_size.is_some_and(|size| size > FFNX_SIZE_THRESHOLD);

    let edition = match executable.as_str() {
        name if name.starts_with("ff8") => Edition::FF8,
        name if name.starts_with("ff7_ja")
            && driver_size.is_some_and(|size| size < FFNX_SIZE_THRESHOLD) =>
        {
            Edition::FF7(Store::EStore)
        }
        _ => Edition::FF7(Store::Standard),
    };

    let lang = language_of(&executable)?;

    Ok(DetectedGame {
        executable,
        edition,
        lang,
        uses_ffnx,
    })
}

/// Extract the language code from `ff7_en.exe` style names
pub fn language_of(executable: &str) -> Result<String> {
    executable
        .trim_end_matches(".exe")
        .split_once('_')
        .map(|(_, lang)| lang)
        .filter(|lang| lang.len() == 2 && lang.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_string)
        .ok_or_else(|| Error::LanguageNotFound(executable.to_string()))
}
