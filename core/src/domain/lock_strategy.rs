// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! WebDAV lock strategy
//!
//! Chosen once when a serving process is constructed and never swapped while
//! it serves.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Compliance level for WebDAV `LOCK`/`UNLOCK`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockStrategy {
    /// Tokens are validated against an in-memory lock table.
    #[default]
    Strict,
    /// Every lock, unlock and token check succeeds; tokens are fabricated.
    ///
    /// Needed for clients (davfs2, git over a mounted share) that lose track
    /// of lock tokens across `MOVE`.
    Permissive,
}

impl LockStrategy {
    pub fn from_no_lock(no_lock: bool) -> Self {
        if no_lock {
            Self::Permissive
        } else {
            Self::Strict
        }
    }
}

impl fmt::Display for LockStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Permissive => write!(f, "permissive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_no_lock() {
        assert_eq!(LockStrategy::from_no_lock(false), LockStrategy::Strict);
        assert_eq!(LockStrategy::from_no_lock(true), LockStrategy::Permissive);
        assert_eq!(LockStrategy::default(), LockStrategy::Strict);
    }
}
