//! Configuration.
//!
//! This module contains:
//! - `LauncherConfig` - the per-game settings read from `FF78Launcher.toml`
//! - Handshake timing constants

mod launcher_config;

pub use launcher_config::*;

/// Name of the launcher, used for the log and config file names
pub const APP_NAME: &str = "FF78Launcher";

/// Default config file name (looked up in the game directory)
pub const CONFIG_FILE: &str = "FF78Launcher.toml";

/// Default log file name
pub const LOG_FILE: &str = "FF78Launcher.log";

/// Handshake timing configuration.
///
/// The game needs a few seconds to map the segment and start reading, so
/// acknowledgments are waited for in bounded slices: 20 × 3s = 60s max.
pub mod timing {
    use std::time::Duration;

    /// Wait for one acknowledgment slice.
    pub const ACK_TIMEOUT: Duration = Duration::from_secs(3);

    /// Number of acknowledgment slices before a send gives up.
    pub const ACK_ATTEMPTS: u32 = 20;

    /// How long the game message worker blocks before checking for shutdown.
    pub const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(250);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_constants() {
        assert_eq!(timing::ACK_TIMEOUT.as_secs(), 3);
        assert_eq!(timing::ACK_ATTEMPTS, 20);
        let total = timing::ACK_TIMEOUT * timing::ACK_ATTEMPTS;
        assert_eq!(total.as_secs(), 60);
    }

    #[test]
    fn test_worker_polls_faster_than_ack() {
        assert!(timing::WORKER_POLL_INTERVAL < timing::ACK_TIMEOUT);
    }
}
