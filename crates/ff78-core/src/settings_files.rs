//! Legacy `ffNvideo.cfg` / `ffNsound.cfg` files read by the game when FFNx is
//! not installed.
//!
//! # Video file layout
//!
//! ```text
//! Offset   Field                      Size
//! ─────────────────────────────────────────
//! 0x00     window width               4
//! 0x04     window height              4
//! 0x08     refresh rate               4
//! 0x0C     fullscreen                 4
//! 0x10     (reserved, always 0)       4
//! 0x14     keep aspect ratio          4
//! 0x18     linear filtering           4
//! 0x1C     original mode              4
//! 0x20     pause on background (FF8)  4
//! ```
//!
//! The sound file is sfx volume followed by music volume. All values are
//! little-endian 32-bit integers.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::LauncherConfig;
use crate::edition::Edition;
use crate::error::Result;

pub fn video_file_name(edition: Edition) -> String {
    format!("{}video.cfg", edition.short_name())
}

pub fn sound_file_name(edition: Edition) -> String {
    format!("{}sound.cfg", edition.short_name())
}

pub fn encode_video(config: &LauncherConfig, edition: Edition) -> Vec<u8> {
    let mut values = vec![
        config.window_width,
        config.window_height,
        config.refresh_rate,
        u32::from(config.fullscreen),
        0,
        u32::from(config.keep_aspect_ratio),
        u32::from(config.enable_linear_filtering),
        u32::from(config.original_mode),
    ];
    if edition.is_ff8() {
        values.push(u32::from(config.pause_game_on_background));
    }
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn encode_sound(config: &LauncherConfig) -> Vec<u8> {
    [config.sfx_volume, config.music_volume]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

/// Write both files into `settings_dir`, creating it if needed
pub fn write_settings_files(
    settings_dir: &Path,
    config: &LauncherConfig,
    edition: Edition,
) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(settings_dir)?;

    let video = settings_dir.join(video_file_name(edition));
    fs::write(&video, encode_video(config, edition))?;
    info!("Wrote {:?}", video);

    let sound = settings_dir.join(sound_file_name(edition));
    fs::write(&sound, encode_sound(config))?;
    info!("Wrote {:?}", sound);

    Ok((video, sound))
}
