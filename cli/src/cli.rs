// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! Command line definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::ServeArgs;

/// webdavd - serve a directory over WebDAV in the background
#[derive(Debug, Parser)]
#[command(name = "webdavd")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Registry (PID file) location (default: <temp dir>/webdavd.pid)
    #[arg(long, global = true, env = "WEBDAVD_PID_FILE", value_name = "FILE")]
    pub pid_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "WEBDAVD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start WebDAV server in background
    Start(ServeArgs),

    /// Stop WebDAV server
    Stop,

    /// Show service status
    Status,

    /// Run WebDAV server in foreground
    Run(ServeArgs),
}
