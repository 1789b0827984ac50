// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT

use std::io;
use std::process::{Command, Output};
use tracing::warn;

use super::{ProcessControl, ProcessError, ProcessHandle};

/// `tasklist`/`taskkill` based process control for Windows hosts
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessControl;

impl SystemProcessControl {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug)]
struct WindowsProcess {
    pid: u32,
}

fn taskkill(pid: u32, force: bool) -> Result<(), ProcessError> {
    let signal = if force { "taskkill /F" } else { "taskkill" };
    let mut cmd = Command::new("taskkill");
    if force {
        cmd.arg("/F");
    }
    let output = cmd
        .args(["/PID", &pid.to_string()])
        .output()
        .map_err(|source| ProcessError::Signal { pid, signal, source })?;

    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("not found") {
        return Err(ProcessError::NotFound(pid));
    }
    Err(ProcessError::Signal {
        pid,
        signal,
        source: io::Error::other(stderr.trim().to_string()),
    })
}

fn tasklist(pid: u32) -> io::Result<Output> {
    Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH", "/FO", "CSV"])
        .output()
}

/// Whether `pid` appears in a `tasklist` CSV listing.
///
/// A failed query counts as alive: treating it as dead would let the
/// supervisor discard the record of a live owner.
fn listed(result: io::Result<Output>, pid: u32) -> bool {
    match result {
        Ok(output) => String::from_utf8_lossy(&output.stdout).contains(&format!("\"{}\"", pid)),
        Err(e) => {
            warn!(pid, "tasklist failed, assuming process is alive: {}", e);
            true
        }
    }
}

impl ProcessHandle for WindowsProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_alive(&self) -> bool {
        SystemProcessControl.is_running(self.pid)
    }

    fn terminate(&self) -> Result<(), ProcessError> {
        taskkill(self.pid, false)
    }

    fn kill(&self) -> Result<(), ProcessError> {
        taskkill(self.pid, true)
    }
}

impl ProcessControl for SystemProcessControl {
    fn is_running(&self, pid: u32) -> bool {
        listed(tasklist(pid), pid)
    }

    fn find(&self, pid: u32) -> Result<Box<dyn ProcessHandle>, ProcessError> {
        if !self.is_running(pid) {
            return Err(ProcessError::NotFound(pid));
        }
        Ok(Box::new(WindowsProcess { pid }))
    }
}
