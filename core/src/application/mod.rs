// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT

pub mod launcher;
pub mod readiness;
pub mod supervisor;

pub use launcher::{DetachedLauncher, Launcher};
pub use readiness::{wait_for_health, ReadinessError};
pub use supervisor::{Outcome, ServiceState, Supervisor, SupervisorError};
