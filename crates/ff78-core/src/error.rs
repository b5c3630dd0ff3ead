use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No game executable found in {0}")]
    GameNotFound(String),

    #[error("More than one game executable found: {0:?}")]
    AmbiguousGame(Vec<String>),

    #[error("No language found for executable: {0}")]
    LanguageNotFound(String),

    #[error("Config parse error: {0}")]
    ConfigParseError(String),

    #[error("Semaphore {name} failed: {message}")]
    SemaphoreFailed { name: String, message: String },

    #[error("Shared memory {name} failed: {message}")]
    SharedMemoryFailed { name: String, message: String },

    #[error("Timed out waiting on {0}")]
    WaitTimedOut(String),

    #[error("Message payload of {size} bytes does not fit in {capacity} bytes")]
    PayloadTooLarge { size: usize, capacity: usize },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Invalid object name {name:?}: {message}")]
    InvalidObjectName { name: String, message: String },

    #[error("Game message worker panicked")]
    WorkerPanicked,

    #[error("Failed to launch {exe}: {message}")]
    ProcessLaunchFailed { exe: String, message: String },

    #[error("{0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
