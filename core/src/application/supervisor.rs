// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! Service Supervisor
//!
//! Implements `start`, `stop` and `status` as a small state machine over the
//! registry record:
//!
//! | State             | Record  | Owner process |
//! |-------------------|---------|---------------|
//! | `Unregistered`    | absent  | -             |
//! | `RegisteredLive`  | present | running       |
//! | `RegisteredStale` | present | gone          |
//!
//! Every command holds the registry lock from the first read to the last
//! write, so concurrent invocations observe each other's effects in order.
//! Stale records are removed as soon as they are observed.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Single-owner lifecycle of the detached serving process

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use super::launcher::Launcher;
use crate::domain::config::ServeConfig;
use crate::infrastructure::pidfile::{Registry, RegistryError};
use crate::infrastructure::process::{ProcessControl, ProcessError};

/// How long a terminated process gets to exit before it is killed
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Supervisor errors
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to spawn serving process: {0}")]
    Spawn(#[source] io::Error),

    #[error("Failed to record serving process (PID: {pid}): {source}")]
    Register {
        pid: u32,
        #[source]
        source: RegistryError,
    },

    #[error("Failed to stop process (PID: {pid}): {source}")]
    Termination {
        pid: u32,
        #[source]
        source: ProcessError,
    },
}

/// What the registry says about the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Unregistered,
    RegisteredLive { pid: u32 },
    RegisteredStale { pid: u32 },
}

/// Result of one supervisor command; `Display` is the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Started { pid: u32 },
    AlreadyRunning { pid: u32 },
    Stopped { pid: u32 },
    Running { pid: u32 },
    NotRunning,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Started { pid } => write!(f, "Service started (PID: {})", pid),
            Outcome::AlreadyRunning { pid } => {
                write!(f, "Service is already running (PID: {})", pid)
            }
            Outcome::Stopped { pid } => write!(f, "Service stopped (PID: {})", pid),
            Outcome::Running { pid } => write!(f, "Service is running (PID: {})", pid),
            Outcome::NotRunning => write!(f, "Service is not running"),
        }
    }
}

pub struct Supervisor {
    registry: Box<dyn Registry>,
    process: Arc<dyn ProcessControl>,
    launcher: Arc<dyn Launcher>,
    stop_grace: Duration,
    poll_interval: Duration,
}

impl Supervisor {
    pub fn new(
        registry: Box<dyn Registry>,
        process: Arc<dyn ProcessControl>,
        launcher: Arc<dyn Launcher>,
    ) -> Self {
        Self {
            registry,
            process,
            launcher,
            stop_grace: DEFAULT_STOP_GRACE,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn registry(&self) -> &dyn Registry {
        self.registry.as_ref()
    }

    /// Current state, without cleaning up a stale record.
    pub fn state(&self) -> Result<ServiceState, SupervisorError> {
        let _lock = RegistryLock::acquire(self.registry.as_ref())?;
        self.observe()
    }

    /// Spawn a serving process unless one is already live.
    pub fn start(&self, config: &ServeConfig) -> Result<Outcome, SupervisorError> {
        let _lock = RegistryLock::acquire(self.registry.as_ref())?;

        match self.observe()? {
            ServiceState::RegisteredLive { pid } => {
                debug!(pid, "Service already running");
                return Ok(Outcome::AlreadyRunning { pid });
            }
            ServiceState::RegisteredStale { pid } => self.clear_stale(pid)?,
            ServiceState::Unregistered => {}
        }

        let pid = self
            .launcher
            .launch(config)
            .map_err(SupervisorError::Spawn)?;

        if let Err(source) = self.registry.write(pid) {
            warn!(pid, "Failed to record serving process, killing it");
            if let Err(e) = self.process.kill(pid) {
                warn!(pid, "Failed to kill unrecorded serving process: {}", e);
            }
            return Err(SupervisorError::Register { pid, source });
        }

        debug!(pid, root = %config.root.display(), "Service started");
        Ok(Outcome::Started { pid })
    }

    /// Stop the live serving process and remove its record.
    ///
    /// The process is asked to terminate and given the stop grace period to
    /// exit. If the request fails or the process outlives the grace period
    /// it is killed, once. When both fail the record is left in place.
    pub fn stop(&self) -> Result<Outcome, SupervisorError> {
        let _lock = RegistryLock::acquire(self.registry.as_ref())?;

        let pid = match self.observe()? {
            ServiceState::Unregistered => return Ok(Outcome::NotRunning),
            ServiceState::RegisteredStale { pid } => {
                self.clear_stale(pid)?;
                return Ok(Outcome::NotRunning);
            }
            ServiceState::RegisteredLive { pid } => pid,
        };

        self.shut_down(pid)?;
        self.remove_record()?;

        debug!(pid, "Service stopped");
        Ok(Outcome::Stopped { pid })
    }

    /// Report whether the service is running, removing a stale record.
    pub fn status(&self) -> Result<Outcome, SupervisorError> {
        let _lock = RegistryLock::acquire(self.registry.as_ref())?;

        match self.observe()? {
            ServiceState::Unregistered => Ok(Outcome::NotRunning),
            ServiceState::RegisteredStale { pid } => {
                self.clear_stale(pid)?;
                Ok(Outcome::NotRunning)
            }
            ServiceState::RegisteredLive { pid } => Ok(Outcome::Running { pid }),
        }
    }

    // Caller holds the registry lock.
    fn observe(&self) -> Result<ServiceState, SupervisorError> {
        match self.registry.read() {
            Ok(pid) if self.process.is_running(pid) => Ok(ServiceState::RegisteredLive { pid }),
            Ok(pid) => Ok(ServiceState::RegisteredStale { pid }),
            Err(RegistryError::NotFound(_)) => Ok(ServiceState::Unregistered),
            Err(e) => Err(e.into()),
        }
    }

    fn clear_stale(&self, pid: u32) -> Result<(), SupervisorError> {
        debug!(
            pid,
            path = %self.registry.path().display(),
            "Removing stale registry record"
        );
        self.remove_record()
    }

    fn remove_record(&self) -> Result<(), SupervisorError> {
        match self.registry.remove() {
            Ok(()) | Err(RegistryError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn shut_down(&self, pid: u32) -> Result<(), SupervisorError> {
        match self.process.terminate(pid) {
            Ok(()) => {
                if self.wait_for_exit(pid) {
                    return Ok(());
                }
                warn!(
                    pid,
                    "Process still running after {:?}, killing",
                    self.stop_grace
                );
            }
            Err(ProcessError::NotFound(_)) => return Ok(()),
            Err(e) => warn!(pid, "Graceful termination failed: {}", e),
        }

        match self.process.kill(pid) {
            Ok(()) | Err(ProcessError::NotFound(_)) => Ok(()),
            Err(source) => Err(SupervisorError::Termination { pid, source }),
        }
    }

    fn wait_for_exit(&self, pid: u32) -> bool {
        let deadline = Instant::now() + self.stop_grace;
        loop {
            if !self.process.is_running(pid) {
                debug!(pid, "Process exited");
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

/// Holds the registry lock until dropped.
struct RegistryLock<'a> {
    registry: &'a dyn Registry,
}

impl<'a> RegistryLock<'a> {
    fn acquire(registry: &'a dyn Registry) -> Result<Self, RegistryError> {
        registry.lock()?;
        Ok(Self { registry })
    }
}

impl Drop for RegistryLock<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.registry.unlock() {
            warn!("Failed to release registry lock: {}", e);
        }
    }
}
