//! Cross-process handshake channel.
//!
//! The launcher and the game exchange one message at a time per direction
//! through a shared word array. Two semaphore pairs sequence the exchange:
//!
//! 1. The writer fills the direction's part and releases its "can read" signal.
//! 2. The reader waits on "can read", copies the message out and releases
//!    "did read".
//! 3. The writer returns once "did read" is signaled.
//!
//! Backends implement [`Semaphore`] and [`SharedWords`]; callers only see
//! [`HandshakeChannel::send`] and [`HandshakeChannel::receive`].

mod memory;
mod message;
mod os;

pub use memory::{MemoryChannel, MemorySegment, MemorySemaphore};
pub use message::{HEADER_WORDS, MAX_PAYLOAD_WORDS, Message, Payload, RawMessage};
pub use os::{NamedSemaphore, OsChannel, SharedMapping, open_os_channel};

use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, trace};

use crate::config::timing;
use crate::error::{Error, Result};
use crate::layout::{GAME_PART_OFFSET, LAUNCHER_PART_OFFSET, WORD};
use crate::retry::RetryStrategy;

/// A counting semaphore shared with the other process
pub trait Semaphore: Send + Sync {
    /// Object name, used in errors and logs
    fn name(&self) -> &str;

    /// Increment the count by one, waking one waiter
    fn release(&self) -> Result<()>;

    /// Wait until the count is positive and decrement it.
    ///
    /// Returns `Ok(false)` when `timeout` elapsed first. `None` waits forever.
    fn wait(&self, timeout: Option<Duration>) -> Result<bool>;
}

/// The shared segment viewed as an array of 32-bit words
pub trait SharedWords: Send + Sync {
    /// Length of the segment in words
    fn len_words(&self) -> usize;

    /// Copy `out.len()` words starting at word `offset`
    fn read_words(&self, offset: usize, out: &mut [u32]) -> Result<()>;

    /// Copy `words` to word `offset`
    fn write_words(&self, offset: usize, words: &[u32]) -> Result<()>;
}

/// Message direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    LauncherToGame,
    GameToLauncher,
}

impl Direction {
    /// First word of the part carrying this direction's messages
    pub fn part_word_offset(self) -> usize {
        match self {
            Direction::LauncherToGame => LAUNCHER_PART_OFFSET / WORD,
            Direction::GameToLauncher => GAME_PART_OFFSET / WORD,
        }
    }

    fn index(self) -> usize {
        match self {
            Direction::LauncherToGame => 0,
            Direction::GameToLauncher => 1,
        }
    }
}

/// Names of the OS objects for one launcher prefix (`ff7`, `ff8`, `choco`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNames {
    pub game_can_read: String,
    pub game_did_read: String,
    pub launcher_can_read: String,
    pub launcher_did_read: String,
    pub shared_memory: String,
}

impl ObjectNames {
    pub fn new(prefix: &str) -> Self {
        Self {
            game_can_read: format!("{prefix}_gameCanReadMsgSem"),
            game_did_read: format!("{prefix}_gameDidReadMsgSem"),
            launcher_can_read: format!("{prefix}_launcherCanReadMsgSem"),
            launcher_did_read: format!("{prefix}_launcherDidReadMsgSem"),
            shared_memory: format!("{prefix}_sharedMemoryWithLauncher"),
        }
    }
}

/// How long a sender waits for the reader's acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckPolicy {
    pub timeout: Duration,
    pub attempts: u32,
}

impl Default for AckPolicy {
    fn default() -> Self {
        Self {
            timeout: timing::ACK_TIMEOUT,
            attempts: timing::ACK_ATTEMPTS,
        }
    }
}

impl RetryStrategy for AckPolicy {
    fn attempts(&self) -> u32 {
        self.attempts
    }

    fn pause_after(&self, _attempt: u32) -> Option<Duration> {
        // The semaphore wait already spent `timeout`
        None
    }
}

struct HandoffPair<S> {
    can_read: S,
    did_read: S,
}

/// Shared segment plus the two hand-off pairs
pub struct HandshakeChannel<S, M> {
    memory: M,
    to_game: HandoffPair<S>,
    to_launcher: HandoffPair<S>,
    ack: AckPolicy,
    in_flight: [Mutex<()>; 2],
}

impl<S: Semaphore, M: SharedWords> HandshakeChannel<S, M> {
    /// Assemble a channel from its parts.
    ///
    /// `game_can_read`/`game_did_read` sequence launcher → game messages,
    /// `launcher_can_read`/`launcher_did_read` game → launcher messages.
    pub fn new(
        memory: M,
        game_can_read: S,
        game_did_read: S,
        launcher_can_read: S,
        launcher_did_read: S,
    ) -> Self {
        Self {
            memory,
            to_game: HandoffPair {
                can_read: game_can_read,
                did_read: game_did_read,
            },
            to_launcher: HandoffPair {
                can_read: launcher_can_read,
                did_read: launcher_did_read,
            },
            ack: AckPolicy::default(),
            in_flight: [Mutex::new(()), Mutex::new(())],
        }
    }

    pub fn with_ack_policy(mut self, ack: AckPolicy) -> Self {
        self.ack = ack;
        self
    }

    pub fn ack_policy(&self) -> AckPolicy {
        self.ack
    }

    fn pair(&self, direction: Direction) -> &HandoffPair<S> {
        match direction {
            Direction::LauncherToGame => &self.to_game,
            Direction::GameToLauncher => &self.to_launcher,
        }
    }

    /// Write `message` for the reader of `direction` and wait for its acknowledgment.
    ///
    /// A message that is still unread when the wait runs out is taken back, so
    /// a failed send leaves the direction free for the next one.
    pub fn send(&self, direction: Direction, message: &Message) -> Result<()> {
        let words = message.encode()?;
        let pair = self.pair(direction);

        // One message in flight per direction
        let _guard = self.in_flight[direction.index()]
            .lock()
            .map_err(|_| Error::SemaphoreFailed {
                name: pair.can_read.name().to_string(),
                message: "in-flight lock poisoned".to_string(),
            })?;

        // An acknowledgment that arrived after an earlier send gave up
        if pair.did_read.wait(Some(Duration::ZERO))? {
            debug!("Discarded late acknowledgment on {}", pair.did_read.name());
        }

        self.memory
            .write_words(direction.part_word_offset(), &words)?;
        pair.can_read.release()?;
        trace!(
            "Sent kind {} ({} words) {:?}, waiting on {}",
            message.kind,
            words.len(),
            direction,
            pair.did_read.name()
        );

        let timeout = self.ack.timeout;
        let acknowledged = self.ack.run(|attempt| match pair.did_read.wait(Some(timeout)) {
            Ok(true) => Ok(Ok(())),
            Ok(false) => {
                debug!(
                    "No acknowledgment on {} yet (attempt {}/{})",
                    pair.did_read.name(),
                    attempt + 1,
                    self.ack.attempts
                );
                Err(Error::WaitTimedOut(pair.did_read.name().to_string()))
            }
            Err(e) => Ok(Err(e)),
        });

        match acknowledged {
            Ok(result) => result,
            Err(timed_out) => self.withdraw(pair, message.kind, timed_out),
        }
    }

    /// Settle a send whose acknowledgment never came
    fn withdraw(&self, pair: &HandoffPair<S>, kind: u32, timed_out: Error) -> Result<()> {
        if pair.can_read.wait(Some(Duration::ZERO))? {
            debug!("Withdrew unread kind {} from {}", kind, pair.can_read.name());
            return Err(timed_out);
        }

        // The reader already took the message; its acknowledgment is on the way
        if pair.did_read.wait(Some(self.ack.timeout))? {
            debug!("Kind {} acknowledged late on {}", kind, pair.did_read.name());
            return Ok(());
        }
        Err(timed_out)
    }

    /// Wait for the next message of `direction`, without bound
    pub fn receive(&self, direction: Direction) -> Result<RawMessage> {
        let pair = self.pair(direction);
        if !pair.can_read.wait(None)? {
            return Err(Error::WaitTimedOut(pair.can_read.name().to_string()));
        }
        self.take(direction)
    }

    /// Wait up to `timeout` for the next message of `direction`
    pub fn try_receive(&self, direction: Direction, timeout: Duration) -> Result<Option<RawMessage>> {
        let pair = self.pair(direction);
        if !pair.can_read.wait(Some(timeout))? {
            return Ok(None);
        }
        self.take(direction).map(Some)
    }

    /// Copy the pending message out and acknowledge it
    fn take(&self, direction: Direction) -> Result<RawMessage> {
        let pair = self.pair(direction);
        let offset = direction.part_word_offset();

        let mut header = [0u32; HEADER_WORDS];
        let read = self
            .memory
            .read_words(offset, &mut header)
            .and_then(|()| {
                let [kind, length] = header;
                let mut data = vec![0u32; RawMessage::payload_words(length)?];
                self.memory.read_words(offset + HEADER_WORDS, &mut data)?;
                Ok(RawMessage { kind, length, data })
            });

        // Acknowledge even an undecodable message so the writer is not stuck
        pair.did_read.release()?;
        read
    }
}
