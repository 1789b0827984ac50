// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! Serve Configuration
//!
//! Everything a serving process needs to know to come up: which directory,
//! which address, whether requests are logged and which lock strategy the
//! WebDAV handler runs with. The same value is rendered back into `run`
//! arguments when the supervisor spawns a detached serving process, so the
//! two must stay in sync.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Validated, immutable serving parameters

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use super::lock_strategy::LockStrategy;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("port must be between 1 and 65535, got {0}")]
    InvalidPort(u16),

    #[error("--log-dir requires --log")]
    LogDirWithoutLog,

    #[error("Log directory does not exist: {0}")]
    MissingLogDirectory(PathBuf),

    #[error("Failed to resolve directory {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parameters for one serving process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    /// Directory exposed as the WebDAV root
    pub root: PathBuf,
    /// IP address (or host name) to bind
    pub bind: String,
    /// TCP port; `0` asks the OS for an ephemeral port
    pub port: u16,
    /// Whether request logging is enabled
    pub log: bool,
    /// Custom request log directory (only meaningful with `log`)
    pub log_dir: Option<PathBuf>,
    pub lock_strategy: LockStrategy,
}

impl ServeConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            log: false,
            log_dir: None,
            lock_strategy: LockStrategy::Strict,
        }
    }

    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_request_log(mut self, log_dir: Option<PathBuf>) -> Self {
        self.log = true;
        self.log_dir = log_dir;
        self
    }

    pub fn with_lock_strategy(mut self, lock_strategy: LockStrategy) -> Self {
        self.lock_strategy = lock_strategy;
        self
    }

    /// `bind:port` as handed to the listener
    pub fn socket_addr(&self) -> String {
        if self.bind.contains(':') && !self.bind.starts_with('[') {
            format!("[{}]:{}", self.bind, self.port)
        } else {
            format!("{}:{}", self.bind, self.port)
        }
    }

    /// Validate user-supplied parameters and make the root absolute.
    ///
    /// The root and log directory are canonicalized so a detached process
    /// started from another working directory uses the same folders.
    pub fn resolve(mut self) -> Result<Self, ConfigError> {
        validate_port(self.port)?;
        if let Some(dir) = self.log_dir.take() {
            if !self.log {
                return Err(ConfigError::LogDirWithoutLog);
            }
            let resolved = resolve_dir(&dir).map_err(|e| match e {
                ConfigError::MissingDirectory(p) | ConfigError::NotADirectory(p) => {
                    ConfigError::MissingLogDirectory(p)
                }
                other => other,
            })?;
            self.log_dir = Some(resolved);
        }
        self.root = resolve_dir(&self.root)?;
        Ok(self)
    }

    /// Render the equivalent `run` arguments (without the subcommand itself).
    pub fn to_run_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--dir".into(),
            self.root.clone().into_os_string(),
            "--port".into(),
            self.port.to_string().into(),
            "--bind".into(),
            self.bind.clone().into(),
        ];
        if self.log {
            args.push("--log".into());
            if let Some(dir) = &self.log_dir {
                args.push("--log-dir".into());
                args.push(dir.clone().into_os_string());
            }
        }
        if self.lock_strategy == LockStrategy::Permissive {
            args.push("--no-lock".into());
        }
        args
    }
}

/// Reject port 0 for user-facing commands and warn about privileged ports.
pub fn validate_port(port: u16) -> Result<(), ConfigError> {
    if port == 0 {
        return Err(ConfigError::InvalidPort(port));
    }
    if port < 1024 && !cfg!(windows) {
        warn!(
            port,
            "port {} requires root privileges on {}",
            port,
            std::env::consts::OS
        );
    }
    Ok(())
}

fn resolve_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    let meta = match std::fs::metadata(dir) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::MissingDirectory(dir.to_path_buf()))
        }
        Err(source) => {
            return Err(ConfigError::Resolve {
                path: dir.to_path_buf(),
                source,
            })
        }
    };
    if !meta.is_dir() {
        return Err(ConfigError::NotADirectory(dir.to_path_buf()));
    }
    std::fs::canonicalize(dir).map_err(|source| ConfigError::Resolve {
        path: dir.to_path_buf(),
        source,
    })
}
