// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! Detached serving process launcher
//!
//! The supervisor never serves in-process. It re-executes the current binary
//! with the `run` subcommand and the equivalent serving arguments, detached
//! from the invoking terminal session, and records the child's PID.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Spawn contract between `start` and `run`

use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

use crate::domain::config::ServeConfig;

pub const STDOUT_FILE_NAME: &str = "webdavd.out";
pub const STDERR_FILE_NAME: &str = "webdavd.err";

/// Starts a serving process for `config` and returns its PID.
pub trait Launcher: Send + Sync {
    fn launch(&self, config: &ServeConfig) -> io::Result<u32>;
}

/// Re-executes a binary as `<exe> [global args] run <serve args>`
#[derive(Debug, Clone)]
pub struct DetachedLauncher {
    executable: PathBuf,
    output_dir: PathBuf,
    global_args: Vec<OsString>,
}

impl DetachedLauncher {
    /// Child stdout/stderr land in `output_dir`.
    pub fn new(executable: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            output_dir: output_dir.into(),
            global_args: Vec::new(),
        }
    }

    /// Launcher for the currently running executable.
    pub fn current(output_dir: impl Into<PathBuf>) -> io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, output_dir))
    }

    /// Arguments placed before the `run` subcommand (e.g. `--log-level`).
    pub fn with_global_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.global_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn stdout_path(&self) -> PathBuf {
        self.output_dir.join(STDOUT_FILE_NAME)
    }

    pub fn stderr_path(&self) -> PathBuf {
        self.output_dir.join(STDERR_FILE_NAME)
    }

    /// The `run` invocation for `config`, without stdio or detach settings.
    pub fn command(&self, config: &ServeConfig) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.global_args)
            .arg("run")
            .args(config.to_run_args());
        cmd
    }
}

impl Launcher for DetachedLauncher {
    fn launch(&self, config: &ServeConfig) -> io::Result<u32> {
        let mut cmd = self.command(config);

        let stdout_file = File::create(self.stdout_path())?;
        let stderr_file = File::create(self.stderr_path())?;
        cmd.stdin(Stdio::null())
            .stdout(stdout_file)
            .stderr(stderr_file);

        detach(&mut cmd);

        let mut child = cmd.spawn()?;
        let pid = child.id();
        // Reap on exit, otherwise the child lingers as a zombie and still
        // looks alive to signal 0.
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        debug!(
            pid,
            stdout = %self.stdout_path().display(),
            stderr = %self.stderr_path().display(),
            "Spawned serving process"
        );
        Ok(pid)
    }
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // New process group: terminal signals aimed at the caller skip the child
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(CREATE_NEW_PROCESS_GROUP | DETACHED_PROCESS);
}
