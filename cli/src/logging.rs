// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use std::io::IsTerminal;

/// Initialize tracing subscriber for logging
///
/// `RUST_LOG` wins over `level`. Output goes to stderr so status lines on
/// stdout stay machine-readable. Colors only when stderr is a terminal, since
/// a detached serving process writes to a plain file.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(())
}
