// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! Process control
//!
//! Platform-abstracted liveness probing and termination of arbitrary
//! processes by PID. Cooperative termination and forced kill are separate
//! operations so callers can escalate without knowing signal numbers.

use std::fmt;
use std::io;
use thiserror::Error;

#[cfg(test)]
pub(crate) mod mock;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::SystemProcessControl;
#[cfg(windows)]
pub use windows::SystemProcessControl;

/// Process control errors
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Process {0} not found")]
    NotFound(u32),

    #[error("Failed to send {signal} to process {pid}: {source}")]
    Signal {
        pid: u32,
        signal: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Capabilities over one process
pub trait ProcessHandle: fmt::Debug + Send {
    fn pid(&self) -> u32;

    fn is_alive(&self) -> bool;

    /// Ask the process to exit (SIGTERM or platform equivalent).
    fn terminate(&self) -> Result<(), ProcessError>;

    /// Terminate unconditionally.
    fn kill(&self) -> Result<(), ProcessError>;
}

/// Operations over arbitrary processes, not necessarily our children
pub trait ProcessControl: Send + Sync {
    /// Liveness probe; never fails, absence is `false`.
    fn is_running(&self, pid: u32) -> bool;

    fn find(&self, pid: u32) -> Result<Box<dyn ProcessHandle>, ProcessError>;

    fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
        self.find(pid)?.terminate()
    }

    fn kill(&self, pid: u32) -> Result<(), ProcessError> {
        self.find(pid)?.kill()
    }
}
