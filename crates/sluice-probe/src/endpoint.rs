// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-endpoint health probing.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use sluice_core::{Endpoint, HealthState, SluiceError, TunnelProbe};
use tracing::{debug, warn};

/// Relative path of the backend's lightweight liveness endpoint.
const VERSION_PATH: &str = "/app/version";

/// Computes the health state of a backend endpoint for the current
/// dispatch cycle.
///
/// Tunnel-gated endpoints short-circuit to `TunnelDown` without being
/// contacted when the tunnel probe fails. Results are valid for the
/// current cycle only and must not be cached across cycles.
pub struct EndpointProbe {
    client: reqwest::Client,
    tunnel: Option<Arc<dyn TunnelProbe>>,
    probe_timeout: Duration,
}

impl EndpointProbe {
    /// Creates a probe with its own short-timeout HTTP client.
    ///
    /// `tunnel` is `None` when no gateway is configured, which disables
    /// tunnel gating entirely.
    pub fn new(
        tunnel: Option<Arc<dyn TunnelProbe>>,
        probe_timeout: Duration,
    ) -> Result<Self, SluiceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(probe_timeout)
            .timeout(probe_timeout)
            .build()
            .map_err(|e| SluiceError::Internal(format!("failed to build probe HTTP client: {e}")))?;

        Ok(Self {
            client,
            tunnel,
            probe_timeout,
        })
    }

    /// Probes one endpoint and maps the outcome to a [`HealthState`].
    pub async fn check(&self, endpoint: &Endpoint) -> HealthState {
        if endpoint.requires_tunnel
            && let Some(tunnel) = &self.tunnel
        {
            if !tunnel.is_up(self.probe_timeout).await {
                debug!(endpoint = %endpoint.name, "tunnel down, endpoint not contacted");
                return HealthState::TunnelDown;
            }
        }

        let url = endpoint.url(VERSION_PATH);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(endpoint = %endpoint.name, "endpoint healthy");
                HealthState::Healthy
            }
            Ok(resp)
                if matches!(
                    resp.status(),
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
                ) =>
            {
                warn!(endpoint = %endpoint.name, status = %resp.status(), "endpoint rejected probe as unauthenticated");
                HealthState::AuthRejected
            }
            Ok(resp) => {
                warn!(endpoint = %endpoint.name, status = %resp.status(), "endpoint answered with failure status");
                HealthState::Unreachable
            }
            Err(e) => {
                debug!(endpoint = %endpoint.name, error = %e, "endpoint unreachable");
                HealthState::Unreachable
            }
        }
    }
}
