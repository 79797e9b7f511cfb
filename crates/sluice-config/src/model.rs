// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the sluice dispatch pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sluice_core::{Credentials, Endpoint};

/// Top-level sluice configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional; without a `[primary]`
/// endpoint section the dispatcher has nothing to deliver to and every job
/// goes straight to the durable queue.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SluiceConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Private tunnel gateway probing.
    #[serde(default)]
    pub tunnel: TunnelConfig,

    /// Primary backend endpoint. Tried first.
    #[serde(default)]
    pub primary: Option<EndpointConfig>,

    /// Optional secondary backend endpoint, tried when the primary is
    /// unhealthy or rejects a job.
    #[serde(default)]
    pub secondary: Option<EndpointConfig>,

    /// Durable queue settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// HTTP client timeouts.
    #[serde(default)]
    pub http: HttpConfig,

    /// Dispatch pacing settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl SluiceConfig {
    /// Builds the priority-ordered endpoint list from the configured
    /// sections. Absence of a secondary endpoint simply shortens the list.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let mut endpoints = Vec::new();
        if let Some(cfg) = &self.primary {
            endpoints.push(cfg.to_endpoint("primary", 0));
        }
        if let Some(cfg) = &self.secondary {
            endpoints.push(cfg.to_endpoint("secondary", 1));
        }
        endpoints
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Private tunnel gateway probing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TunnelConfig {
    /// Gateway IP address probed for tunnel liveness. `None` disables
    /// tunnel gating entirely.
    #[serde(default)]
    pub gateway: Option<String>,

    /// Per-probe timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Maximum time to wait for the tunnel to come back, in seconds.
    #[serde(default = "default_reconnect_max_wait_secs")]
    pub reconnect_max_wait_secs: u64,

    /// Interval between reconnect polls, in seconds.
    #[serde(default = "default_reconnect_poll_interval_secs")]
    pub reconnect_poll_interval_secs: u64,
}

impl TunnelConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn reconnect_max_wait(&self) -> Duration {
        Duration::from_secs(self.reconnect_max_wait_secs)
    }

    pub fn reconnect_poll_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_poll_interval_secs)
    }
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            gateway: None,
            probe_timeout_ms: default_probe_timeout_ms(),
            reconnect_max_wait_secs: default_reconnect_max_wait_secs(),
            reconnect_poll_interval_secs: default_reconnect_poll_interval_secs(),
        }
    }
}

fn default_probe_timeout_ms() -> u64 {
    5000
}

fn default_reconnect_max_wait_secs() -> u64 {
    60
}

fn default_reconnect_poll_interval_secs() -> u64 {
    5
}

/// One backend endpoint section (`[primary]` or `[secondary]`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// Base URL of the backend, e.g. `http://10.0.0.2:8080`.
    pub url: String,

    /// Login username.
    pub username: String,

    /// Login password.
    pub password: String,

    /// Whether this endpoint is reachable only through the private tunnel.
    #[serde(default = "default_requires_tunnel")]
    pub requires_tunnel: bool,
}

impl EndpointConfig {
    fn to_endpoint(&self, name: &str, priority: u8) -> Endpoint {
        Endpoint {
            name: name.to_string(),
            base_url: self.url.clone(),
            priority,
            credentials: Credentials {
                username: self.username.clone(),
                password: self.password.clone(),
            },
            requires_tunnel: self.requires_tunnel,
        }
    }
}

fn default_requires_tunnel() -> bool {
    true
}

/// Durable queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Path of the JSON queue file.
    #[serde(default = "default_queue_path")]
    pub path: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            path: default_queue_path(),
        }
    }
}

fn default_queue_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("sluice").join("pending-jobs.json"))
        .unwrap_or_else(|| std::path::PathBuf::from("pending-jobs.json"))
        .to_string_lossy()
        .into_owned()
}

/// HTTP client timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Connection establishment timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Total per-request timeout in seconds (the hard ceiling).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Dispatch pacing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Maximum jobs per dispatch batch; larger inputs are chunked by the
    /// CLI before submission.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Delay between consecutive submissions to the same endpoint, in
    /// milliseconds.
    #[serde(default = "default_inter_request_delay_ms")]
    pub inter_request_delay_ms: u64,
}

impl DispatchConfig {
    pub fn inter_request_delay(&self) -> Duration {
        Duration::from_millis(self.inter_request_delay_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            inter_request_delay_ms: default_inter_request_delay_ms(),
        }
    }
}

fn default_max_batch_size() -> usize {
    50
}

fn default_inter_request_delay_ms() -> u64 {
    500
}
