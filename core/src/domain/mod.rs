// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! Domain layer: plain data and pure rules, no I/O beyond config validation.

pub mod config;
pub mod lock_strategy;
pub mod path_guard;
