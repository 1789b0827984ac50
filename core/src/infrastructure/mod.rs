// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! Infrastructure layer: everything that touches the OS or the network.

pub mod pidfile;
pub mod process;
pub mod webdav;
