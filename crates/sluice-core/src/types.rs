// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the sluice dispatch pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A single download job handed to the dispatcher.
///
/// The `id` is an opaque idempotency key (typically a content URI) and is
/// never interpreted beyond equality. `payload` carries submission
/// parameters (destination category, save path, pause state) as opaque
/// string pairs. Jobs are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub payload: BTreeMap<String, String>,
}

impl Job {
    /// Creates a job with an empty payload.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: BTreeMap::new(),
        }
    }

    /// Adds one submission parameter, builder-style.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

/// Login credentials for one backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// One configured instance of the remote job-processing backend.
///
/// Configured at startup and never mutated at runtime; the only mutable
/// state associated with an endpoint is its session, which lives in the
/// session manager.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: String,
    pub base_url: String,
    /// Lower priority is tried first.
    pub priority: u8,
    pub credentials: Credentials,
    /// Whether reachability depends on the private tunnel being up.
    pub requires_tunnel: bool,
}

impl Endpoint {
    /// Joins a relative path onto the endpoint's base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

/// Reachability/authentication status of an endpoint.
///
/// Recomputed at the start of every dispatch cycle and never cached across
/// cycles: network state can change between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum HealthState {
    /// Not yet probed in this cycle.
    Unknown,
    /// The private tunnel the endpoint depends on is down; the endpoint
    /// itself was not contacted.
    TunnelDown,
    /// Connection failure or timeout reaching the endpoint.
    Unreachable,
    /// The endpoint answered but rejected the probe as unauthenticated.
    AuthRejected,
    /// The endpoint answered with success.
    Healthy,
}

/// Terminal status of one job after a dispatch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum DispatchStatus {
    /// Confirmed accepted by a live backend.
    Delivered,
    /// Could not be delivered or durably queued. Only a local
    /// queue-persistence failure produces this status.
    Failed,
    /// Appended to the durable queue for later replay.
    Queued,
}

/// Per-job outcome of one `submit` or `replay_queue` call.
///
/// Produced once per dispatch cycle and never persisted by this layer.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub job_id: String,
    pub status: DispatchStatus,
    /// Name of the endpoint that accepted the job, for `Delivered` results.
    pub endpoint_used: Option<String>,
    /// Diagnostic string describing the last failure, for logging only.
    pub error: Option<String>,
}

impl DispatchResult {
    pub fn delivered(job_id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: DispatchStatus::Delivered,
            endpoint_used: Some(endpoint.into()),
            error: None,
        }
    }

    pub fn queued(job_id: impl Into<String>, error: Option<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: DispatchStatus::Queued,
            endpoint_used: None,
            error,
        }
    }

    pub fn failed(job_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: DispatchStatus::Failed,
            endpoint_used: None,
            error: Some(error.into()),
        }
    }
}
