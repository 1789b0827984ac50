// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT

//! Service lifecycle commands
//!
//! Commands: start, stop, status, run
//!
//! `start`/`stop`/`status` go through the supervisor and print exactly one
//! status line. `run` serves in the foreground and is what `start` spawns.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::Commands;
use webdavd_core::application::launcher::DetachedLauncher;
use webdavd_core::domain::config::{DEFAULT_BIND, DEFAULT_PORT};
use webdavd_core::infrastructure::pidfile::{PidFile, Registry};
use webdavd_core::infrastructure::process::SystemProcessControl;
use webdavd_core::infrastructure::webdav::{AccessLog, RequestLogger, WebDavServer};
use webdavd_core::{LockStrategy, Outcome, ServeConfig, Supervisor, SupervisorError};

/// Options shared by `start` and `run`
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Directory to serve
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// IP address to bind to
    #[arg(long, default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Enable HTTP request logging
    #[arg(long)]
    pub log: bool,

    /// Custom log directory (must exist)
    #[arg(long, requires = "log", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Accept any WebDAV lock token (for davfs2 compatibility)
    #[arg(long)]
    pub no_lock: bool,
}

impl ServeArgs {
    /// Unvalidated serving parameters.
    pub fn to_config(&self) -> ServeConfig {
        let config = ServeConfig::new(self.dir.clone())
            .with_port(self.port)
            .with_bind(self.bind.clone())
            .with_lock_strategy(LockStrategy::from_no_lock(self.no_lock));
        if self.log {
            config.with_request_log(self.log_dir.clone())
        } else {
            config
        }
    }
}

pub async fn handle_command(
    command: Commands,
    pid_file: Option<PathBuf>,
    log_level: &str,
) -> Result<()> {
    match command {
        Commands::Start(args) => start(args, pid_file, log_level).await,
        Commands::Stop => stop(pid_file).await,
        Commands::Status => status(pid_file).await,
        Commands::Run(args) => run(args).await,
    }
}

async fn start(args: ServeArgs, pid_file: Option<PathBuf>, log_level: &str) -> Result<()> {
    let config = args.to_config().resolve()?;
    let supervisor = supervisor(pid_file, log_level)?;

    let outcome = blocking(move || supervisor.start(&config)).await?;
    report(&outcome);
    Ok(())
}

async fn stop(pid_file: Option<PathBuf>) -> Result<()> {
    let supervisor = supervisor(pid_file, "info")?;

    let outcome = blocking(move || supervisor.stop()).await?;
    report(&outcome);
    Ok(())
}

async fn status(pid_file: Option<PathBuf>) -> Result<()> {
    let supervisor = supervisor(pid_file, "info")?;

    let outcome = blocking(move || supervisor.status()).await?;
    report(&outcome);
    Ok(())
}

async fn run(args: ServeArgs) -> Result<()> {
    let config = args.to_config().resolve()?;

    let logger: Option<Arc<dyn RequestLogger>> = if config.log {
        let log = AccessLog::open(config.log_dir.as_deref())
            .context("Failed to initialize logger")?;
        Some(Arc::new(log))
    } else {
        None
    };

    let mut server = WebDavServer::new(&config, logger);
    let addr = server.bind().await?;
    println!("WebDAV server: http://{}", addr);

    server.start().await.context("Server error")?;
    Ok(())
}

/// Supervisor over the registry at `pid_file` (or the default location).
///
/// Spawned serving processes write their output next to the registry.
pub fn supervisor(pid_file: Option<PathBuf>, log_level: &str) -> Result<Supervisor> {
    let registry = pid_file.map(PidFile::with_path).unwrap_or_default();
    let output_dir = registry
        .path()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(std::env::temp_dir);

    let launcher = DetachedLauncher::current(output_dir)
        .context("Failed to get current executable path")?
        .with_global_args(["--log-level", log_level]);

    Ok(Supervisor::new(
        Box::new(registry),
        Arc::new(SystemProcessControl::new()),
        Arc::new(launcher),
    ))
}

/// Supervisor commands block on the registry lock; keep them off the runtime.
async fn blocking<F>(command: F) -> Result<Outcome>
where
    F: FnOnce() -> Result<Outcome, SupervisorError> + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(command)
        .await
        .context("Supervisor task failed")??;
    Ok(outcome)
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Started { .. } | Outcome::Stopped { .. } | Outcome::Running { .. } => {
            println!("{}", format!("✓ {}", outcome).green());
        }
        Outcome::AlreadyRunning { .. } | Outcome::NotRunning => {
            println!("{}", format!("ℹ {}", outcome).yellow());
        }
    }
}
