//! In-process channel backend.
//!
//! Both ends live in one process: semaphores are a counter plus a condition
//! variable, the segment is a heap buffer. Useful to drive the launcher side
//! against a simulated game.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{HandshakeChannel, ObjectNames, Semaphore, SharedWords};
use crate::error::{Error, Result};
use crate::layout::{SEGMENT_SIZE, WORD};

pub type MemoryChannel = HandshakeChannel<MemorySemaphore, MemorySegment>;

impl MemoryChannel {
    /// Build an in-process channel using the same object names as the OS backend
    pub fn in_memory(prefix: &str) -> Self {
        let names = ObjectNames::new(prefix);
        HandshakeChannel::new(
            MemorySegment::new(SEGMENT_SIZE / WORD),
            MemorySemaphore::binary(names.game_can_read),
            MemorySemaphore::binary(names.game_did_read),
            MemorySemaphore::binary(names.launcher_can_read),
            MemorySemaphore::binary(names.launcher_did_read),
        )
    }
}

#[derive(Debug)]
pub struct MemorySemaphore {
    name: String,
    max: u32,
    count: Mutex<u32>,
    available: Condvar,
}

impl MemorySemaphore {
    /// Initial count 0, maximum count 1
    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max: 1,
            count: Mutex::new(0),
            available: Condvar::new(),
        }
    }

    /// Current count
    pub fn count(&self) -> u32 {
        self.lock().map(|count| *count).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, u32>> {
        self.count.lock().map_err(|_| self.poisoned())
    }

    fn poisoned(&self) -> Error {
        Error::SemaphoreFailed {
            name: self.name.clone(),
            message: "lock poisoned".to_string(),
        }
    }
}

impl Semaphore for MemorySemaphore {
    fn name(&self) -> &str {
        &self.name
    }

    fn release(&self) -> Result<()> {
        let mut count = self.lock()?;
        if *count >= self.max {
            return Err(Error::SemaphoreFailed {
                name: self.name.clone(),
                message: format!("count would exceed maximum {}", self.max),
            });
        }
        *count += 1;
        self.available.notify_one();
        Ok(())
    }

    fn wait(&self, timeout: Option<Duration>) -> Result<bool> {
        let mut count = self.lock()?;
        let deadline = timeout.map(|timeout| Instant::now() + timeout);

        while *count == 0 {
            count = match deadline {
                None => self.available.wait(count).map_err(|_| self.poisoned())?,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(false);
                    }
                    self.available
                        .wait_timeout(count, deadline - now)
                        .map_err(|_| self.poisoned())?
                        .0
                }
            };
        }

        *count -= 1;
        Ok(true)
    }
}

#[derive(Debug)]
pub struct MemorySegment {
    words: Mutex<Vec<u32>>,
}

impl MemorySegment {
    pub fn new(len_words: usize) -> Self {
        Self {
            words: Mutex::new(vec![0; len_words]),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<u32>>> {
        self.words.lock().map_err(|_| Error::SharedMemoryFailed {
            name: "in-memory segment".to_string(),
            message: "lock poisoned".to_string(),
        })
    }
}

fn out_of_bounds(offset: usize, len: usize, capacity: usize) -> Error {
    Error::SharedMemoryFailed {
        name: "in-memory segment".to_string(),
        message: format!(
            "Out of bounds: offset={}, len={}, capacity={}",
            offset, len, capacity
        ),
    }
}

impl SharedWords for MemorySegment {
    fn len_words(&self) -> usize {
        self.lock().map(|words| words.len()).unwrap_or(0)
    }

    fn read_words(&self, offset: usize, out: &mut [u32]) -> Result<()> {
        let words = self.lock()?;
        let source = words
            .get(offset..offset + out.len())
            .ok_or_else(|| out_of_bounds(offset, out.len(), words.len()))?;
        out.copy_from_slice(source);
        Ok(())
    }

    fn write_words(&self, offset: usize, source: &[u32]) -> Result<()> {
        let mut words = self.lock()?;
        let capacity = words.len();
        let target = words
            .get_mut(offset..offset + source.len())
            .ok_or_else(|| out_of_bounds(offset, source.len(), capacity))?;
        target.copy_from_slice(source);
        Ok(())
    }
}
