pub mod channel;
pub mod config;
pub mod context;
pub mod edition;
pub mod error;
pub mod layout;
pub mod paths;
pub mod process;
pub mod retry;
pub mod session;
pub mod settings_files;
pub mod worker;

pub use channel::{Direction, HandshakeChannel, MemoryChannel, Message, OsChannel, RawMessage};
pub use config::LauncherConfig;
pub use context::LaunchContext;
pub use edition::{DetectedGame, Edition, Store};
pub use error::{Error, Result};
pub use layout::{Field, FieldTable};
pub use paths::GameDirs;
pub use process::{CommandSpawner, GameSpawner, RunningGame};
pub use session::{SessionOutcome, launch};
