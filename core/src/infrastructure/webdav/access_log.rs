// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! HTTP request access log
//!
//! One line per request, appended to a timestamped file:
//!
//! ```text
//! 2026/10/18 14:03:11 127.0.0.1:53122 PROPFIND /docs/ 207 1.84ms davfs2/1.7.0
//! ```
//!
//! Files are named `webdavd_<YYYY-mm-dd_HH-MM-SS>.log`. The default
//! directory (`<local data dir>/webdavd/logs`) is created on demand; a custom
//! directory must already exist. Old files are never pruned here;
//! [`AccessLog::log_dir`] is the hook for external retention tooling.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
    Router,
};
use chrono::Local;
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use super::server::RequestLogger;

pub const LOG_FILE_PREFIX: &str = "webdavd_";

/// Access log errors
#[derive(Debug, Error)]
pub enum AccessLogError {
    #[error("failed to get user data directory")]
    NoDataDir,

    #[error("log directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("log path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to create log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// File-backed request logger
pub struct AccessLog {
    enabled: bool,
    dir: Option<PathBuf>,
    file: Option<PathBuf>,
    sink: Option<Sink>,
}

impl AccessLog {
    /// Logger that reports itself disabled and wraps nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            dir: None,
            file: None,
            sink: None,
        }
    }

    /// Open a new log file in `log_dir`, or in the default directory.
    pub fn open(log_dir: Option<&Path>) -> Result<Self, AccessLogError> {
        let dir = match log_dir {
            Some(dir) => {
                let meta = fs::metadata(dir)
                    .map_err(|_| AccessLogError::MissingDirectory(dir.to_path_buf()))?;
                if !meta.is_dir() {
                    return Err(AccessLogError::NotADirectory(dir.to_path_buf()));
                }
                dir.to_path_buf()
            }
            None => {
                let dir = default_log_dir()?;
                fs::create_dir_all(&dir).map_err(|source| AccessLogError::Io {
                    path: dir.clone(),
                    source,
                })?;
                dir
            }
        };

        let name = format!(
            "{}{}.log",
            LOG_FILE_PREFIX,
            Local::now().format("%Y-%m-%d_%H-%M-%S")
        );
        let path = dir.join(name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AccessLogError::Io {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), "Request logging enabled");

        let sink: Box<dyn Write + Send> = Box::new(file);
        Ok(Self {
            enabled: true,
            dir: Some(dir),
            file: Some(path),
            sink: Some(Arc::new(Mutex::new(sink))),
        })
    }

    /// Enabled logger writing to an arbitrary sink.
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        let sink: Box<dyn Write + Send> = Box::new(writer);
        Self {
            enabled: true,
            dir: None,
            file: None,
            sink: Some(Arc::new(Mutex::new(sink))),
        }
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

/// `<local data dir>/webdavd/logs`
pub fn default_log_dir() -> Result<PathBuf, AccessLogError> {
    dirs::data_local_dir()
        .map(|dir| dir.join("webdavd").join("logs"))
        .ok_or(AccessLogError::NoDataDir)
}

impl RequestLogger for AccessLog {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn middleware(&self, router: Router) -> Router {
        match (&self.sink, self.enabled) {
            (Some(sink), true) => router.layer(middleware::from_fn_with_state(
                Arc::clone(sink),
                record,
            )),
            _ => router,
        }
    }
}

async fn record(State(sink): State<Sink>, req: Request, next: Next) -> Response {
    let started = Instant::now();
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let response = next.run(req).await;

    let line = format!(
        "{} {} {} {} {} {:?} {}\n",
        Local::now().format("%Y/%m/%d %H:%M:%S"),
        remote,
        method,
        path,
        response.status().as_u16(),
        started.elapsed(),
        user_agent,
    );
    let mut sink = sink.lock();
    if let Err(e) = sink.write_all(line.as_bytes()).and_then(|()| sink.flush()) {
        warn!("Failed to write access log entry: {}", e);
    }

    response
}
