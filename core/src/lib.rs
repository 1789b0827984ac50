// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! webdavd core
//!
//! Supervision and serving primitives for running a directory as a WebDAV
//! share in the background.
//!
//! # Architecture
//!
//! - **domain:** serve configuration, lock strategy, request path guard
//! - **infrastructure:** pid file registry, process control, WebDAV server,
//!   access log
//! - **application:** supervisor state machine and detached launcher

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::supervisor::{Outcome, ServiceState, Supervisor, SupervisorError};
pub use domain::config::ServeConfig;
pub use domain::lock_strategy::LockStrategy;
