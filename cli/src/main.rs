// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT

//! # webdavd
//!
//! Serves a directory over WebDAV, either in the foreground (`run`) or as a
//! detached background service managed through a PID file registry.
//!
//! ## Commands
//!
//! - `webdavd start` - Start WebDAV server in background
//! - `webdavd stop` - Stop WebDAV server
//! - `webdavd status` - Show service status
//! - `webdavd run` - Run WebDAV server in foreground

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use webdavd::cli::Cli;
use webdavd::commands;
use webdavd::logging::init_logging;

#[tokio::main]
async fn main() {
    // A missing .env is the normal case
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    init_logging(&cli.log_level)?;

    match cli.command {
        Some(command) => commands::handle_command(command, cli.pid_file, &cli.log_level).await,
        None => {
            // No command provided - show help
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}
