//! Game process abstraction for testability.
//!
//! The session only needs to start the game and wait for it to exit. These
//! traits let tests replace the real executable with a simulated game.

use std::path::Path;
use std::process::{Child, Command};

use tracing::debug;

use crate::error::{Error, Result};

/// A started game process
pub trait RunningGame {
    /// Get the process ID.
    fn pid(&self) -> u32;

    /// Block until the process exits, returning its exit code if it has one.
    fn wait(&mut self) -> Result<Option<i32>>;
}

/// Trait for starting the game.
pub trait GameSpawner {
    /// The type of process returned by this spawner.
    type Game: RunningGame;

    /// Start `executable` with `working_dir` as its current directory.
    fn spawn(&self, executable: &Path, working_dir: &Path) -> Result<Self::Game>;
}

/// Starts the real executable
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandSpawner;

pub struct GameProcess {
    child: Child,
}

impl GameSpawner for CommandSpawner {
    type Game = GameProcess;

    fn spawn(&self, executable: &Path, working_dir: &Path) -> Result<GameProcess> {
        debug!("Spawning {:?} in {:?}", executable, working_dir);
        let child = Command::new(executable)
            .current_dir(working_dir)
            .spawn()
            .map_err(|e| Error::ProcessLaunchFailed {
                exe: executable.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(GameProcess { child })
    }
}

impl RunningGame for GameProcess {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn wait(&mut self) -> Result<Option<i32>> {
        let status = self.child.wait()?;
        Ok(status.code())
    }
}
