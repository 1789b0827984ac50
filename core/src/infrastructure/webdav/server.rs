// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! WebDAV server lifecycle
//!
//! Handler chain, outermost first:
//! 1. `/health` route (bypasses everything below)
//! 2. request logging, only when the injected logger reports itself enabled
//! 3. directory traversal guard
//! 4. `dav-server` protocol handler with the configured lock system
//!
//! The listener is bound lazily so an ephemeral port (`:0`) is observable
//! through [`WebDavServer::addr`] once [`WebDavServer::bind`] has run.

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dav_server::{localfs::LocalFs, DavHandler};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::lock_system;
use crate::domain::config::ServeConfig;
use crate::domain::lock_strategy::LockStrategy;
use crate::domain::path_guard;

pub const HEALTH_PATH: &str = "/health";

/// Upper bound on draining in-flight requests after a shutdown signal
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to create listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),

    #[error("server shutdown failed: {0}")]
    ShutdownFailed(#[source] io::Error),

    #[error("server shutdown failed: in-flight requests still running after {0:?}")]
    ShutdownTimeout(Duration),

    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Injected request logging collaborator
pub trait RequestLogger: Send + Sync {
    fn enabled(&self) -> bool;

    /// Wrap `router` with request logging.
    fn middleware(&self, router: Router) -> Router;
}

/// One serving process: owns the listener and the handler chain
pub struct WebDavServer {
    addr: String,
    root: PathBuf,
    lock_strategy: LockStrategy,
    router: Router,
    listener: Option<TcpListener>,
    shutdown_timeout: Duration,
}

impl WebDavServer {
    /// Build the handler chain. Nothing is bound until [`bind`](Self::bind)
    /// or [`start`](Self::start).
    pub fn new(config: &ServeConfig, logger: Option<Arc<dyn RequestLogger>>) -> Self {
        Self {
            addr: config.socket_addr(),
            root: config.root.clone(),
            lock_strategy: config.lock_strategy,
            router: router(&config.root, config.lock_strategy, logger),
            listener: None,
            shutdown_timeout: SHUTDOWN_TIMEOUT,
        }
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Bind the listener if not already bound and return the bound address.
    pub async fn bind(&mut self) -> Result<SocketAddr, ServerError> {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => bind_listener(&self.addr).await?,
        };
        let local = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: self.addr.clone(),
            source,
        })?;
        self.listener = Some(listener);
        Ok(local)
    }

    /// Bound address once listening, configured address before.
    pub fn addr(&self) -> String {
        self.listener
            .as_ref()
            .and_then(|l| l.local_addr().ok())
            .map(|a| a.to_string())
            .unwrap_or_else(|| self.addr.clone())
    }

    pub fn lock_strategy(&self) -> LockStrategy {
        self.lock_strategy
    }

    /// The complete handler chain, including the health route.
    pub fn handler(&self) -> Router {
        self.router.clone()
    }

    /// Serve until SIGINT/SIGTERM, then drain gracefully.
    pub async fn start(self) -> Result<(), ServerError> {
        self.serve_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves or serving fails.
    ///
    /// After `shutdown` resolves new connections are refused and in-flight
    /// requests get the shutdown timeout to finish; exceeding it is an
    /// error. A serving failure before any shutdown request is returned as
    /// is, there is nothing to drain.
    pub async fn serve_until<F>(mut self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => bind_listener(&self.addr).await?,
        };
        let local = listener.local_addr().map_err(ServerError::Serve)?;

        info!(
            addr = %local,
            root = %self.root.display(),
            lock_strategy = %self.lock_strategy,
            "WebDAV server listening"
        );

        let (drain_tx, drain_rx) = oneshot::channel::<()>();
        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();
        let mut serving = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = drain_rx.await;
                })
                .await
        });

        let finished = tokio::select! {
            _ = shutdown => None,
            result = &mut serving => Some(result),
        };

        if let Some(result) = finished {
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(ServerError::Serve(e)),
                Err(e) => Err(ServerError::Task(e)),
            };
        }

        info!("Shutting down server...");
        let _ = drain_tx.send(());

        match tokio::time::timeout(self.shutdown_timeout, &mut serving).await {
            Ok(Ok(Ok(()))) => {
                info!("Server stopped gracefully");
                Ok(())
            }
            Ok(Ok(Err(e))) => Err(ServerError::ShutdownFailed(e)),
            Ok(Err(e)) => Err(ServerError::Task(e)),
            Err(_) => {
                serving.abort();
                Err(ServerError::ShutdownTimeout(self.shutdown_timeout))
            }
        }
    }
}

async fn bind_listener(addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Compose the full handler chain for `root`.
pub fn router(
    root: &Path,
    lock_strategy: LockStrategy,
    logger: Option<Arc<dyn RequestLogger>>,
) -> Router {
    let dav = DavHandler::builder()
        .filesystem(LocalFs::new(root, false, false, false))
        .locksystem(lock_system(lock_strategy))
        .build_handler();

    let mut protocol = Router::new()
        .fallback(serve_dav)
        .with_state(dav)
        .layer(middleware::from_fn(traversal_guard));

    if let Some(logger) = logger.filter(|l| l.enabled()) {
        protocol = logger.middleware(protocol);
    }

    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .with_state(Arc::new(HealthState {
            start_time: Instant::now(),
        }))
        .fallback_service(protocol)
}

struct HealthState {
    start_time: Instant,
}

async fn health_handler(State(state): State<Arc<HealthState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn traversal_guard(req: Request, next: Next) -> Response {
    if let Err(e) = path_guard::check(req.uri().path()) {
        warn!(method = %req.method(), error = %e, "Rejected request");
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }
    next.run(req).await
}

async fn serve_dav(State(dav): State<DavHandler>, req: Request) -> Response {
    dav.handle(req).await.map(Body::new)
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
