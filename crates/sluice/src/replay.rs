// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sluice replay` command implementation.

use sluice_config::SluiceConfig;
use sluice_core::{SluiceError, TunnelProbe};
use sluice_probe::PingTunnelProbe;
use tracing::info;

use crate::runtime;

/// Runs the `sluice replay` command: redelivers queued jobs through the
/// normal dispatch path. With `wait`, blocks until the tunnel gateway
/// answers (or the configured reconnect window elapses) before dispatching.
/// Returns the process exit code.
pub async fn run_replay(config: &SluiceConfig, wait: bool) -> Result<i32, SluiceError> {
    if wait {
        if let Some(gateway) = &config.tunnel.gateway {
            info!(%gateway, "waiting for tunnel before replay");
            let probe = PingTunnelProbe::new(gateway.clone());
            let recovered = probe
                .wait_for_reconnect(
                    config.tunnel.reconnect_max_wait(),
                    config.tunnel.reconnect_poll_interval(),
                )
                .await;
            if !recovered {
                eprintln!(
                    "tunnel gateway {gateway} did not answer within {}s, replaying anyway",
                    config.tunnel.reconnect_max_wait_secs
                );
            }
        } else {
            eprintln!("--wait ignored: no tunnel gateway configured");
        }
    }

    let dispatcher = runtime::build_dispatcher(config)?;
    let outcome = dispatcher.replay_queue().await?;

    if outcome.delivered.is_empty() && outcome.still_queued.is_empty() {
        println!("queue is empty, nothing to replay");
        return Ok(0);
    }

    for result in &outcome.delivered {
        println!(
            "delivered  {}  via {}",
            result.job_id,
            result.endpoint_used.as_deref().unwrap_or("?")
        );
    }

    info!(
        delivered = outcome.delivered.len(),
        still_queued = outcome.still_queued.len(),
        "replay finished"
    );
    println!(
        "{} delivered, {} still queued",
        outcome.delivered.len(),
        outcome.still_queued.len()
    );

    if !outcome.still_queued.is_empty() {
        println!(
            "{} job(s) remain in {}; run `sluice replay` again once a backend is reachable.",
            outcome.still_queued.len(),
            config.queue.path
        );
    }
    Ok(0)
}
