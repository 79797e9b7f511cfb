// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires configuration into a running dispatch pipeline.

use std::sync::Arc;

use sluice_config::SluiceConfig;
use sluice_core::{SluiceError, TunnelProbe};
use sluice_dispatch::{build_http_client, Dispatcher};
use sluice_probe::{EndpointProbe, PingTunnelProbe};
use sluice_queue::DurableQueue;
use sluice_session::SessionManager;
use tracing::debug;

/// Builds the dispatcher (probes, session manager, queue, HTTP client)
/// from a validated configuration.
pub fn build_dispatcher(config: &SluiceConfig) -> Result<Dispatcher, SluiceError> {
    let client = build_http_client(
        config.http.connect_timeout(),
        config.http.request_timeout(),
    )?;

    let tunnel: Option<Arc<dyn TunnelProbe>> = config
        .tunnel
        .gateway
        .as_ref()
        .map(|gateway| Arc::new(PingTunnelProbe::new(gateway.clone())) as Arc<dyn TunnelProbe>);
    if tunnel.is_none() {
        debug!("no tunnel gateway configured, tunnel gating disabled");
    }

    let probe = EndpointProbe::new(tunnel, config.tunnel.probe_timeout())?;
    let sessions = Arc::new(SessionManager::new(client.clone()));
    let queue = DurableQueue::new(&config.queue.path);

    Ok(Dispatcher::new(
        config.endpoints(),
        probe,
        sessions,
        queue,
        client,
        config.dispatch.inter_request_delay(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_config::load_and_validate_str;

    #[test]
    fn builds_from_default_config() {
        let config = SluiceConfig::default();
        let dispatcher = build_dispatcher(&config).unwrap();
        assert!(dispatcher.queue().path().ends_with("pending-jobs.json"));
    }

    #[test]
    fn builds_with_endpoints_and_gateway() {
        let config = load_and_validate_str(
            r#"
[tunnel]
gateway = "10.8.0.1"

[primary]
url = "http://10.0.0.2:8080"
username = "admin"
password = "secret"
"#,
        )
        .unwrap();
        build_dispatcher(&config).unwrap();
    }
}
