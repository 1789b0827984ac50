// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT

use std::io;

use super::{ProcessControl, ProcessError, ProcessHandle};

/// Signal-based process control for Unix hosts
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessControl;

impl SystemProcessControl {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug)]
struct UnixProcess {
    pid: u32,
    raw: libc::pid_t,
}

impl UnixProcess {
    fn signal(&self, signal: libc::c_int, name: &'static str) -> Result<(), ProcessError> {
        // SAFETY: kill(2) has no memory-safety preconditions; raw is a positive pid.
        if unsafe { libc::kill(self.raw, signal) } == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Err(ProcessError::NotFound(self.pid));
        }
        Err(ProcessError::Signal {
            pid: self.pid,
            signal: name,
            source: err,
        })
    }
}

impl ProcessHandle for UnixProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_alive(&self) -> bool {
        probe(self.raw)
    }

    fn terminate(&self) -> Result<(), ProcessError> {
        self.signal(libc::SIGTERM, "SIGTERM")
    }

    fn kill(&self) -> Result<(), ProcessError> {
        self.signal(libc::SIGKILL, "SIGKILL")
    }
}

/// Positive pids only; 0 and negatives would address process groups.
fn to_raw(pid: u32) -> Option<libc::pid_t> {
    libc::pid_t::try_from(pid).ok().filter(|raw| *raw > 0)
}

fn probe(raw: libc::pid_t) -> bool {
    // SAFETY: signal 0 only performs the existence and permission check.
    if unsafe { libc::kill(raw, 0) } == 0 {
        return true;
    }
    // EPERM: the process exists but belongs to someone else
    io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

impl ProcessControl for SystemProcessControl {
    fn is_running(&self, pid: u32) -> bool {
        to_raw(pid).is_some_and(probe)
    }

    fn find(&self, pid: u32) -> Result<Box<dyn ProcessHandle>, ProcessError> {
        let raw = to_raw(pid).ok_or(ProcessError::NotFound(pid))?;
        if !probe(raw) {
            return Err(ProcessError::NotFound(pid));
        }
        Ok(Box::new(UnixProcess { pid, raw }))
    }
}
