#![cfg_attr(not(target_os = "windows"), allow(dead_code, unused_variables))]

use std::time::Duration;

use super::{HandshakeChannel, ObjectNames, Semaphore, SharedWords};
use crate::error::{Error, Result};

#[cfg(target_os = "windows")]
use crate::layout::{SEGMENT_SIZE, WORD};
#[cfg(target_os = "windows")]
use std::ffi::CString;
#[cfg(target_os = "windows")]
use tracing::{debug, warn};
#[cfg(target_os = "windows")]
use windows::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};
#[cfg(target_os = "windows")]
use windows::Win32::System::Memory::{
    CreateFileMappingA, FILE_MAP_ALL_ACCESS, MEMORY_MAPPED_VIEW_ADDRESS, MapViewOfFile,
    PAGE_READWRITE, UnmapViewOfFile,
};
#[cfg(target_os = "windows")]
use windows::Win32::System::Threading::{
    CreateSemaphoreA, INFINITE, ReleaseSemaphore, WaitForSingleObject,
};
#[cfg(target_os = "windows")]
use windows::core::PCSTR;

pub type OsChannel = HandshakeChannel<NamedSemaphore, SharedMapping>;

#[cfg(target_os = "windows")]
const WAIT_OBJECT_0: u32 = 0x0;
#[cfg(target_os = "windows")]
const WAIT_TIMEOUT: u32 = 0x102;

/// Create (or open, if the game already did) every object for `prefix`
#[cfg(target_os = "windows")]
pub fn open_os_channel(prefix: &str) -> Result<OsChannel> {
    let names = ObjectNames::new(prefix);
    debug!("Creating handshake objects: {:?}", names);

    Ok(HandshakeChannel::new(
        SharedMapping::create(&names.shared_memory)?,
        NamedSemaphore::create(&names.game_can_read)?,
        NamedSemaphore::create(&names.game_did_read)?,
        NamedSemaphore::create(&names.launcher_can_read)?,
        NamedSemaphore::create(&names.launcher_did_read)?,
    ))
}

#[cfg(not(target_os = "windows"))]
pub fn open_os_channel(prefix: &str) -> Result<OsChannel> {
    let names = ObjectNames::new(prefix);
    Err(Error::Unsupported(format!(
        "Windows only: cannot create {}",
        names.shared_memory
    )))
}

#[cfg(target_os = "windows")]
fn object_name(name: &str) -> Result<CString> {
    CString::new(name).map_err(|e| Error::InvalidObjectName {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// A named Win32 semaphore (initial count 0, maximum 1)
#[cfg(target_os = "windows")]
pub struct NamedSemaphore {
    handle: HANDLE,
    name: String,
}

#[cfg(not(target_os = "windows"))]
pub struct NamedSemaphore {
    name: String,
}

// SAFETY: a semaphore HANDLE is a kernel object reference usable from any thread;
// this type owns it and closes it exactly once in Drop.
#[cfg(target_os = "windows")]
unsafe impl Send for NamedSemaphore {}
#[cfg(target_os = "windows")]
unsafe impl Sync for NamedSemaphore {}

#[cfg(target_os = "windows")]
impl NamedSemaphore {
    pub fn create(name: &str) -> Result<Self> {
        let c_name = object_name(name)?;
        // SAFETY: c_name is a valid NUL-terminated string that outlives the call.
        // The returned handle is owned by this struct and closed in Drop.
        let handle = unsafe {
            CreateSemaphoreA(None, 0, 1, PCSTR(c_name.as_ptr() as _)).map_err(|e| {
                Error::SemaphoreFailed {
                    name: name.to_string(),
                    message: e.to_string(),
                }
            })?
        };
        Ok(Self {
            handle,
            name: name.to_string(),
        })
    }

    fn failed(&self, message: impl Into<String>) -> Error {
        Error::SemaphoreFailed {
            name: self.name.clone(),
            message: message.into(),
        }
    }
}

#[cfg(not(target_os = "windows"))]
impl NamedSemaphore {
    pub fn create(name: &str) -> Result<Self> {
        Err(Error::Unsupported(format!(
            "Windows only: cannot create semaphore {}",
            name
        )))
    }
}

#[cfg(target_os = "windows")]
impl Semaphore for NamedSemaphore {
    fn name(&self) -> &str {
        &self.name
    }

    fn release(&self) -> Result<()> {
        // SAFETY: self.handle is a live semaphore handle owned by self.
        unsafe { ReleaseSemaphore(self.handle, 1, None) }.map_err(|e| self.failed(e.to_string()))
    }

    fn wait(&self, timeout: Option<Duration>) -> Result<bool> {
        let millis = match timeout {
            Some(timeout) => u32::try_from(timeout.as_millis()).unwrap_or(INFINITE - 1),
            None => INFINITE,
        };
        // SAFETY: self.handle is a live semaphore handle owned by self.
        let result = unsafe { WaitForSingleObject(self.handle, millis) };
        match result.0 {
            WAIT_OBJECT_0 => Ok(true),
            WAIT_TIMEOUT => Ok(false),
            other => Err(self.failed(format!(
                "WaitForSingleObject returned {:#x}: {}",
                other,
                windows::core::Error::from_win32()
            ))),
        }
    }
}

#[cfg(not(target_os = "windows"))]
impl Semaphore for NamedSemaphore {
    fn name(&self) -> &str {
        &self.name
    }

    fn release(&self) -> Result<()> {
        Err(Error::Unsupported(
            "Windows only: semaphores not supported on this platform".to_string(),
        ))
    }

    fn wait(&self, _timeout: Option<Duration>) -> Result<bool> {
        Err(Error::Unsupported(
            "Windows only: semaphores not supported on this platform".to_string(),
        ))
    }
}

#[cfg(target_os = "windows")]
impl Drop for NamedSemaphore {
    fn drop(&mut self) {
        if !self.handle.is_invalid() {
            // SAFETY: self.handle was returned by CreateSemaphoreA and not closed yet.
            if let Err(e) = unsafe { CloseHandle(self.handle) } {
                warn!("Failed to close semaphore {}: {}", self.name, e);
            }
        }
    }
}

/// A named, pagefile-backed file mapping and its view
#[cfg(target_os = "windows")]
pub struct SharedMapping {
    handle: HANDLE,
    view: MEMORY_MAPPED_VIEW_ADDRESS,
    name: String,
}

#[cfg(not(target_os = "windows"))]
pub struct SharedMapping {
    name: String,
}

// SAFETY: the mapping handle and view are process-wide; every access goes through
// bounds-checked volatile word copies and the channel's semaphores sequence them.
#[cfg(target_os = "windows")]
unsafe impl Send for SharedMapping {}
#[cfg(target_os = "windows")]
unsafe impl Sync for SharedMapping {}

#[cfg(target_os = "windows")]
impl SharedMapping {
    pub fn create(name: &str) -> Result<Self> {
        let c_name = object_name(name)?;
        let failed = |message: String| Error::SharedMemoryFailed {
            name: name.to_string(),
            message,
        };

        // SAFETY: c_name is a valid NUL-terminated string that outlives the call.
        // INVALID_HANDLE_VALUE requests a pagefile-backed mapping.
        let handle = unsafe {
            CreateFileMappingA(
                INVALID_HANDLE_VALUE,
                None,
                PAGE_READWRITE,
                0,
                SEGMENT_SIZE as u32,
                PCSTR(c_name.as_ptr() as _),
            )
            .map_err(|e| failed(e.to_string()))?
        };

        // SAFETY: handle is the mapping created above; mapping the whole object.
        let view = unsafe { MapViewOfFile(handle, FILE_MAP_ALL_ACCESS, 0, 0, 0) };
        if view.Value.is_null() {
            let error = windows::core::Error::from_win32();
            // SAFETY: handle is valid and not shared with anything yet.
            let _ = unsafe { CloseHandle(handle) };
            return Err(failed(format!("MapViewOfFile failed: {}", error)));
        }

        Ok(Self {
            handle,
            view,
            name: name.to_string(),
        })
    }

    fn check_bounds(&self, offset: usize, len: usize) -> Result<()> {
        if offset + len > self.len_words() {
            return Err(Error::SharedMemoryFailed {
                name: self.name.clone(),
                message: format!(
                    "Out of bounds: offset={}, len={}, capacity={}",
                    offset,
                    len,
                    self.len_words()
                ),
            });
        }
        Ok(())
    }
}

#[cfg(not(target_os = "windows"))]
impl SharedMapping {
    pub fn create(name: &str) -> Result<Self> {
        Err(Error::Unsupported(format!(
            "Windows only: cannot create shared memory {}",
            name
        )))
    }
}

#[cfg(target_os = "windows")]
impl SharedWords for SharedMapping {
    fn len_words(&self) -> usize {
        SEGMENT_SIZE / WORD
    }

    fn read_words(&self, offset: usize, out: &mut [u32]) -> Result<()> {
        self.check_bounds(offset, out.len())?;
        let base = self.view.Value as *const u32;
        for (i, word) in out.iter_mut().enumerate() {
            // SAFETY: offset + i < len_words (checked above) and the view spans SEGMENT_SIZE bytes.
            *word = unsafe { std::ptr::read_volatile(base.add(offset + i)) };
        }
        Ok(())
    }

    fn write_words(&self, offset: usize, words: &[u32]) -> Result<()> {
        self.check_bounds(offset, words.len())?;
        let base = self.view.Value as *mut u32;
        for (i, &word) in words.iter().enumerate() {
            // SAFETY: offset + i < len_words (checked above) and the view is writable.
            unsafe { std::ptr::write_volatile(base.add(offset + i), word) };
        }
        Ok(())
    }
}

#[cfg(not(target_os = "windows"))]
impl SharedWords for SharedMapping {
    fn len_words(&self) -> usize {
        0
    }

    fn read_words(&self, _offset: usize, _out: &mut [u32]) -> Result<()> {
        Err(Error::Unsupported(format!(
            "Windows only: cannot read {}",
            self.name
        )))
    }

    fn write_words(&self, _offset: usize, _words: &[u32]) -> Result<()> {
        Err(Error::Unsupported(format!(
            "Windows only: cannot write {}",
            self.name
        )))
    }
}

#[cfg(target_os = "windows")]
impl Drop for SharedMapping {
    fn drop(&mut self) {
        // SAFETY: view and handle were created in `create` and are released exactly once.
        unsafe {
            if let Err(e) = UnmapViewOfFile(self.view) {
                warn!("Failed to unmap {}: {}", self.name, e);
            }
            if let Err(e) = CloseHandle(self.handle) {
                warn!("Failed to close {}: {}", self.name, e);
            }
        }
    }
}
