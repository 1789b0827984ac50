// Copyright (c) 2026 webdavd contributors
// SPDX-License-Identifier: MIT
//! Readiness probe against the `/health` route

use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use crate::infrastructure::webdav::HEALTH_PATH;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("{url} not healthy after {timeout:?}: {last}")]
    Timeout {
        url: String,
        timeout: Duration,
        last: String,
    },
}

/// Poll `base_url` + [`HEALTH_PATH`] until it answers with a success status.
///
/// Returns the uptime reported by the server.
pub async fn wait_for_health(base_url: &str, timeout: Duration) -> Result<u64, ReadinessError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(500))
        .build()?;
    let health_url = format!("{}{}", base_url.trim_end_matches('/'), HEALTH_PATH);
    let deadline = Instant::now() + timeout;

    loop {
        let last = match client.get(&health_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let uptime = resp
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|v| v["uptime_seconds"].as_u64())
                    .unwrap_or(0);
                return Ok(uptime);
            }
            Ok(resp) => format!("HTTP {}", resp.status()),
            Err(e) => e.to_string(),
        };

        if Instant::now() >= deadline {
            return Err(ReadinessError::Timeout {
                url: health_url,
                timeout,
                last,
            });
        }
        debug!(url = %health_url, "Not ready yet: {}", last);
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_times_out_when_nothing_listens() {
        // Bind then drop to get a port with no listener
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = wait_for_health(&format!("http://{}", addr), Duration::from_millis(300))
            .await
            .unwrap_err();
        assert!(matches!(err, ReadinessError::Timeout { .. }));
    }
}
