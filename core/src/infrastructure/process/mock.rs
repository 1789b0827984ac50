// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! Recording process control for tests

use parking_lot::Mutex;
use std::collections::HashSet;
use std::io;
use std::sync::Arc;

use super::{ProcessControl, ProcessError, ProcessHandle};

#[derive(Debug, Default)]
pub struct MockState {
    pub running: HashSet<u32>,
    pub fail_terminate: bool,
    pub fail_kill: bool,
    /// Terminated processes keep running (ignore SIGTERM)
    pub ignore_terminate: bool,
    pub terminated: Vec<u32>,
    pub killed: Vec<u32>,
}

/// Clones share state so tests can inspect calls after handing one over
#[derive(Debug, Clone, Default)]
pub struct MockProcessControl {
    pub state: Arc<Mutex<MockState>>,
}

impl MockProcessControl {
    pub fn with_running(pids: &[u32]) -> Self {
        let mock = Self::default();
        mock.state.lock().running.extend(pids.iter().copied());
        mock
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.state.lock().terminated.clone()
    }

    pub fn killed(&self) -> Vec<u32> {
        self.state.lock().killed.clone()
    }
}

#[derive(Debug)]
struct MockProcess {
    pid: u32,
    state: Arc<Mutex<MockState>>,
}

fn refused(pid: u32, signal: &'static str) -> ProcessError {
    ProcessError::Signal {
        pid,
        signal,
        source: io::Error::new(io::ErrorKind::PermissionDenied, "operation not permitted"),
    }
}

impl ProcessHandle for MockProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_alive(&self) -> bool {
        self.state.lock().running.contains(&self.pid)
    }

    fn terminate(&self) -> Result<(), ProcessError> {
        let mut state = self.state.lock();
        state.terminated.push(self.pid);
        if state.fail_terminate {
            return Err(refused(self.pid, "SIGTERM"));
        }
        if !state.ignore_terminate {
            state.running.remove(&self.pid);
        }
        Ok(())
    }

    fn kill(&self) -> Result<(), ProcessError> {
        let mut state = self.state.lock();
        state.killed.push(self.pid);
        if state.fail_kill {
            return Err(refused(self.pid, "SIGKILL"));
        }
        state.running.remove(&self.pid);
        Ok(())
    }
}

impl ProcessControl for MockProcessControl {
    fn is_running(&self, pid: u32) -> bool {
        self.state.lock().running.contains(&pid)
    }

    fn find(&self, pid: u32) -> Result<Box<dyn ProcessHandle>, ProcessError> {
        Ok(Box::new(MockProcess {
            pid,
            state: Arc::clone(&self.state),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_is_running() {
        let mock = MockProcessControl::with_running(&[1234]);
        assert!(mock.is_running(1234));
        assert!(!mock.is_running(5678));
    }

    #[test]
    fn test_mock_records_calls() {
        let mock = MockProcessControl::with_running(&[1234]);
        mock.terminate(1234).unwrap();
        assert_eq!(mock.terminated(), vec![1234]);
        assert!(!mock.is_running(1234));

        mock.state.lock().fail_kill = true;
        assert!(mock.kill(1234).is_err());
        assert_eq!(mock.killed(), vec![1234]);
    }
}
