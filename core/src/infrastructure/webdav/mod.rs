// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! WebDAV serving process
//!
//! The protocol itself is handled by `dav-server`; this module owns the
//! listener, the handler chain wrapped around the protocol handler and the
//! signal-driven shutdown.

pub mod access_log;
mod server;

pub use access_log::{AccessLog, AccessLogError};
pub use server::{
    router, shutdown_signal, RequestLogger, ServerError, WebDavServer, HEALTH_PATH,
    SHUTDOWN_TIMEOUT,
};

use dav_server::fakels::FakeLs;
use dav_server::ls::DavLockSystem;
use dav_server::memls::MemLs;

use crate::domain::lock_strategy::LockStrategy;

/// Lock table backing the chosen strategy.
///
/// Both strategies sit behind the same `DavLockSystem` interface so the
/// handler chain never branches on the strategy.
pub fn lock_system(strategy: LockStrategy) -> Box<dyn DavLockSystem> {
    let ls: Box<dyn DavLockSystem> = match strategy {
        LockStrategy::Strict => MemLs::new(),
        LockStrategy::Permissive => FakeLs::new(),
    };
    ls
}
