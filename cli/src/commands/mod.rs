// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT

//! Command implementations for the webdavd CLI

pub mod service;

pub use self::service::{handle_command, ServeArgs};
