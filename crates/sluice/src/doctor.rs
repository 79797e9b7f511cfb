// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sluice doctor` command implementation.
//!
//! Runs diagnostic checks against the configured environment to identify
//! configuration issues, tunnel problems, and unreachable endpoints.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sluice_config::SluiceConfig;
use sluice_core::{Endpoint, HealthState, SluiceError, TunnelProbe};
use sluice_dispatch::build_http_client;
use sluice_probe::{EndpointProbe, PingTunnelProbe};
use sluice_queue::DurableQueue;
use sluice_session::SessionManager;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// Check status.
    pub status: CheckStatus,
    /// Human-readable message.
    pub message: String,
    /// Duration the check took.
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Runs the `sluice doctor` command.
///
/// Runs quick diagnostic checks. With `--deep`, also verifies endpoint
/// credentials by performing a real login. With `--plain`, disables
/// colored output. Returns exit code 1 when any check failed.
pub async fn run_doctor(
    config: &SluiceConfig,
    deep: bool,
    plain: bool,
) -> Result<i32, SluiceError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let mut results = Vec::new();

    results.push(check_config().await);
    results.push(check_tunnel(config).await);

    let endpoints = config.endpoints();
    if endpoints.is_empty() {
        let start = Instant::now();
        results.push(CheckResult::new(
            "Endpoints",
            CheckStatus::Warn,
            "no endpoints configured, all jobs will be queued",
            start,
        ));
    } else {
        let tunnel: Option<Arc<dyn TunnelProbe>> = config
            .tunnel
            .gateway
            .as_ref()
            .map(|g| Arc::new(PingTunnelProbe::new(g.clone())) as Arc<dyn TunnelProbe>);
        let probe = EndpointProbe::new(tunnel, config.tunnel.probe_timeout())?;
        for endpoint in &endpoints {
            results.push(check_endpoint(&probe, endpoint).await);
        }
    }

    results.push(check_queue_file(config).await);

    if deep {
        let client = build_http_client(
            config.http.connect_timeout(),
            config.http.request_timeout(),
        )?;
        let sessions = SessionManager::new(client);
        for endpoint in &endpoints {
            results.push(check_credentials(&sessions, endpoint).await);
        }
    }

    print_results(&results, use_color, deep);

    let fail_count = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    Ok(if fail_count > 0 { 1 } else { 0 })
}

fn print_results(results: &[CheckResult], use_color: bool, deep: bool) {
    println!();
    println!("  sluice doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;

    for result in results {
        let duration_ms = result.duration.as_millis();
        let line;

        match result.status {
            CheckStatus::Pass => {
                if use_color {
                    use colored::Colorize;
                    let symbol = "✓".green().to_string();
                    line = format!(
                        "    {symbol} {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    );
                } else {
                    line = format!(
                        "    [OK]   {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    );
                }
            }
            CheckStatus::Warn => {
                warn_count += 1;
                if use_color {
                    use colored::Colorize;
                    let symbol = "!".yellow().to_string();
                    line = format!(
                        "    {symbol} {:<20} {} ({duration_ms}ms)",
                        result.name,
                        result.message.yellow()
                    );
                } else {
                    line = format!(
                        "    [WARN] {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    );
                }
            }
            CheckStatus::Fail => {
                fail_count += 1;
                if use_color {
                    use colored::Colorize;
                    let symbol = "✗".red().to_string();
                    line = format!(
                        "    {symbol} {:<20} {} ({duration_ms}ms)",
                        result.name,
                        result.message.red()
                    );
                } else {
                    line = format!(
                        "    [FAIL] {:<20} {} ({duration_ms}ms)",
                        result.name, result.message
                    );
                }
            }
        }

        println!("{line}");
    }

    println!();

    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
        if !deep {
            println!("  Run with --deep to also verify endpoint credentials.");
        }
    } else {
        println!("  All checks passed.");
    }

    println!();
}

/// Check configuration loads without errors.
async fn check_config() -> CheckResult {
    let start = Instant::now();
    match sluice_config::load_and_validate() {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// Check the tunnel gateway answers a liveness probe.
async fn check_tunnel(config: &SluiceConfig) -> CheckResult {
    let start = Instant::now();
    let Some(gateway) = &config.tunnel.gateway else {
        return CheckResult::new(
            "Tunnel",
            CheckStatus::Pass,
            "no gateway configured (gating disabled)",
            start,
        );
    };

    let probe = PingTunnelProbe::new(gateway.clone());
    if probe.is_up(config.tunnel.probe_timeout()).await {
        CheckResult::new("Tunnel", CheckStatus::Pass, format!("{gateway} reachable"), start)
    } else {
        CheckResult::new(
            "Tunnel",
            CheckStatus::Fail,
            format!("{gateway} did not respond"),
            start,
        )
    }
}

/// Probe one endpoint and map its health state to a check result.
async fn check_endpoint(probe: &EndpointProbe, endpoint: &Endpoint) -> CheckResult {
    let start = Instant::now();
    let name = format!("Endpoint {}", endpoint.name);

    match probe.check(endpoint).await {
        HealthState::Healthy => CheckResult::new(&name, CheckStatus::Pass, "healthy", start),
        HealthState::AuthRejected => CheckResult::new(
            &name,
            CheckStatus::Warn,
            "probe rejected as unauthenticated (login may still succeed)",
            start,
        ),
        HealthState::TunnelDown => {
            CheckResult::new(&name, CheckStatus::Fail, "tunnel down", start)
        }
        state => CheckResult::new(&name, CheckStatus::Fail, state.to_string(), start),
    }
}

/// Check the queue file is absent or parseable.
async fn check_queue_file(config: &SluiceConfig) -> CheckResult {
    let start = Instant::now();
    let queue = DurableQueue::new(&config.queue.path);

    match queue.load() {
        Ok(None) => CheckResult::new("Queue file", CheckStatus::Pass, "empty", start),
        Ok(Some(record)) => CheckResult::new(
            "Queue file",
            CheckStatus::Pass,
            format!("{} job(s) pending", record.jobs.len()),
            start,
        ),
        Err(e) => CheckResult::new(
            "Queue file",
            CheckStatus::Fail,
            format!("unreadable: {e}"),
            start,
        ),
    }
}

/// Deep check: verify credentials with a real login.
async fn check_credentials(sessions: &SessionManager, endpoint: &Endpoint) -> CheckResult {
    let start = Instant::now();
    let name = format!("Credentials {}", endpoint.name);

    match sessions.ensure_session(endpoint).await {
        Ok(_) => CheckResult::new(&name, CheckStatus::Pass, "accepted", start),
        Err(e) => CheckResult::new(&name, CheckStatus::Fail, e.to_string(), start),
    }
}
