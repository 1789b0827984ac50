// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! Request Path Guard
//!
//! Normalizes request paths and detects attempts to climb out of the served
//! root. Checks run on the normalized form, never on the raw string, so
//! percent-encoded separators and redundant segments cannot sneak a `..`
//! past the guard.
//!
//! Unlike a rooted `path.Clean`, a `..` that would climb above `/` is kept
//! rather than swallowed: `/../secret.txt` normalizes to `/../secret.txt`
//! and is rejected instead of silently turning into `/secret.txt`.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Directory traversal prevention for the WebDAV handler chain

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Path guard errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathGuardError {
    #[error("Path traversal attempt detected: {0}")]
    PathTraversal(String),

    #[error("Path contains null byte: {0}")]
    NullByte(String),
}

/// Lexically normalize a URL path.
///
/// Percent-decodes, treats `\` as a separator, drops empty and `.` segments
/// and resolves `..` against preceding segments. Leading `..` segments that
/// have nothing left to pop are preserved.
pub fn normalize(raw: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let mut segments: Vec<&str> = Vec::new();

    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let mut normalized = String::with_capacity(decoded.len() + 1);
    normalized.push('/');
    normalized.push_str(&segments.join("/"));
    normalized
}

/// Validate a request path, returning its normalized form.
pub fn check(raw: &str) -> Result<String, PathGuardError> {
    let normalized = normalize(raw);

    if normalized.contains('\0') {
        return Err(PathGuardError::NullByte(raw.to_string()));
    }

    if normalized.split('/').any(|segment| segment == "..") {
        return Err(PathGuardError::PathTraversal(raw.to_string()));
    }

    Ok(normalized)
}
