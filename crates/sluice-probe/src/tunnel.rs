// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tunnel liveness probing via the system `ping` binary.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use sluice_core::TunnelProbe;
use tokio::process::Command;
use tracing::{debug, warn};

/// Probes the private tunnel by sending a single ICMP echo to the gateway.
///
/// Shells out to the system `ping` binary so no raw-socket capability is
/// required by the process itself. A spawn failure (binary missing, no
/// permission) or a non-zero exit counts as "down", matching the rule that
/// probe errors are indistinguishable from an unreachable tunnel.
#[derive(Debug, Clone)]
pub struct PingTunnelProbe {
    gateway: String,
}

impl PingTunnelProbe {
    pub fn new(gateway: impl Into<String>) -> Self {
        Self {
            gateway: gateway.into(),
        }
    }

    pub fn gateway(&self) -> &str {
        &self.gateway
    }
}

#[async_trait]
impl TunnelProbe for PingTunnelProbe {
    async fn is_up(&self, timeout: Duration) -> bool {
        // `ping -W` takes whole seconds; round up so sub-second timeouts
        // still give the echo a chance to come back.
        let wait_secs = timeout.as_secs().max(1);

        let mut cmd = Command::new("ping");
        cmd.arg("-c")
            .arg("1")
            .arg("-W")
            .arg(wait_secs.to_string())
            .arg(&self.gateway)
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Hard ceiling above ping's own wait so a wedged binary cannot
        // stall the dispatch cycle.
        let ceiling = Duration::from_secs(wait_secs + 2);
        match tokio::time::timeout(ceiling, cmd.status()).await {
            Ok(Ok(status)) => {
                debug!(
                    gateway = %self.gateway,
                    success = status.success(),
                    "tunnel probe finished"
                );
                status.success()
            }
            Ok(Err(e)) => {
                warn!(gateway = %self.gateway, error = %e, "tunnel probe could not run, treating as down");
                false
            }
            Err(_) => {
                warn!(gateway = %self.gateway, "tunnel probe timed out, treating as down");
                false
            }
        }
    }
}
