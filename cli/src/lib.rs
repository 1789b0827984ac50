// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! webdavd CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Argument parsing, logging setup and command handlers

pub mod cli;
pub mod commands;
pub mod logging;
