// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! PID file registry
//!
//! Durable record of which process, if any, owns the service. The record
//! itself is a plain text file holding one decimal PID. Ownership is decided
//! by an exclusive advisory lock held on a sibling `<record>.lock` file, so
//! taking the lock never creates an empty record.
//!
//! # Safety guarantees
//! - Atomic writes via temp file + rename
//! - Blocking exclusive lock (`flock(LOCK_EX)` on Unix, exclusive share mode
//!   on Windows) serializes concurrent start/stop/status invocations
//! - Unlock is idempotent and also runs on drop

use parking_lot::Mutex;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_FILE_NAME: &str = "webdavd.pid";

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Registry record not found: {0}")]
    NotFound(PathBuf),

    #[error("Registry record {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Failed to lock registry {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Registry I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RegistryError {
    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Single-owner service record guarded by an advisory lock
pub trait Registry: Send + Sync {
    fn path(&self) -> &Path;

    /// Read the owning PID.
    fn read(&self) -> Result<u32, RegistryError>;

    /// Overwrite the record with `pid`.
    fn write(&self, pid: u32) -> Result<(), RegistryError>;

    /// Delete the record; `NotFound` when absent.
    fn remove(&self) -> Result<(), RegistryError>;

    /// Block until the exclusive advisory lock is held.
    fn lock(&self) -> Result<(), RegistryError>;

    /// Release the lock; a no-op when not held.
    fn unlock(&self) -> Result<(), RegistryError>;
}

/// File-backed registry
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
    lock_path: PathBuf,
    held: Mutex<Option<File>>,
}

impl PidFile {
    /// Registry in the shared temporary directory.
    pub fn new() -> Self {
        Self::with_path(default_path())
    }

    /// Registry at a fixed location (e.g. a system run directory).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.clone().into_os_string();
        lock_name.push(".lock");
        Self {
            path,
            lock_path: PathBuf::from(lock_name),
            held: Mutex::new(None),
        }
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    pub fn is_locked(&self) -> bool {
        self.held.lock().is_some()
    }
}

impl Default for PidFile {
    fn default() -> Self {
        Self::new()
    }
}

pub fn default_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_FILE_NAME)
}

impl Registry for PidFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<u32, RegistryError> {
        let content = fs::read_to_string(&self.path).map_err(|e| RegistryError::io(&self.path, e))?;
        parse_pid(&content).map_err(|reason| RegistryError::Corrupt {
            path: self.path.clone(),
            reason,
        })
    }

    fn write(&self, pid: u32) -> Result<(), RegistryError> {
        let mut temp_name = self.path.clone().into_os_string();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, pid.to_string()).map_err(|e| RegistryError::io(&temp_path, e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            RegistryError::io(&self.path, e)
        })?;

        debug!(pid, path = %self.path.display(), "Wrote registry record");
        Ok(())
    }

    fn remove(&self) -> Result<(), RegistryError> {
        fs::remove_file(&self.path).map_err(|e| RegistryError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "Removed registry record");
        Ok(())
    }

    fn lock(&self) -> Result<(), RegistryError> {
        let mut held = self.held.lock();
        if held.is_some() {
            return Ok(());
        }

        let file = platform::lock_exclusive(&self.lock_path).map_err(|source| RegistryError::Lock {
            path: self.lock_path.clone(),
            source,
        })?;
        *held = Some(file);
        Ok(())
    }

    fn unlock(&self) -> Result<(), RegistryError> {
        let Some(file) = self.held.lock().take() else {
            return Ok(());
        };
        platform::unlock(&file).map_err(|source| RegistryError::Lock {
            path: self.lock_path.clone(),
            source,
        })
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = self.unlock();
    }
}

fn parse_pid(content: &str) -> Result<u32, String> {
    let trimmed = content.trim();
    let pid = trimmed
        .parse::<u32>()
        .map_err(|e| format!("invalid PID {:?}: {}", trimmed, e))?;
    // 0 and anything beyond i32 would address process groups when signalled
    if pid == 0 || pid > i32::MAX as u32 {
        return Err(format!("PID {} out of range", pid));
    }
    Ok(pid)
}

#[cfg(unix)]
mod platform {
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::os::unix::fs::OpenOptionsExt;
    use std::os::unix::io::AsRawFd;
    use std::path::Path;

    pub fn lock_exclusive(path: &Path) -> io::Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o644)
            .open(path)?;

        loop {
            // SAFETY: fd is a valid descriptor owned by `file` for the whole call.
            let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
            if rc == 0 {
                return Ok(file);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    pub fn unlock(file: &File) -> io::Result<()> {
        // SAFETY: fd is a valid descriptor owned by `file`.
        if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(windows)]
mod platform {
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::os::windows::fs::OpenOptionsExt;
    use std::path::Path;
    use std::time::Duration;

    const ERROR_SHARING_VIOLATION: i32 = 32;

    /// Open with no sharing; the handle itself is the lock.
    pub fn lock_exclusive(path: &Path) -> io::Result<File> {
        loop {
            match OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .share_mode(0)
                .open(path)
            {
                Ok(file) => return Ok(file),
                Err(e) if e.raw_os_error() == Some(ERROR_SHARING_VIOLATION) => {
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Closing the handle (dropping `file`) releases the lock.
    pub fn unlock(_file: &File) -> io::Result<()> {
        Ok(())
    }
}
