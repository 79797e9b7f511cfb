// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seam for tunnel liveness probing.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

/// Determines whether the private network path is currently usable.
///
/// Implementations send a single liveness probe per `is_up` call and never
/// retry internally; retry policy belongs to callers. Probe errors (no
/// network stack permission, missing probe binary) are treated identically
/// to "down".
#[async_trait]
pub trait TunnelProbe: Send + Sync {
    /// Sends one liveness probe. Returns `true` only if a response arrived
    /// within `timeout`.
    async fn is_up(&self, timeout: Duration) -> bool;

    /// Polls [`is_up`](Self::is_up) at fixed intervals until the tunnel
    /// answers or `max_wait` elapses. Returns whichever happened.
    async fn wait_for_reconnect(&self, max_wait: Duration, poll_interval: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            if self.is_up(poll_interval).await {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                debug!("tunnel did not reconnect within {max_wait:?}");
                return false;
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
