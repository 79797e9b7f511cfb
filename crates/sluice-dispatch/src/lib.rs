// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch orchestration for the sluice pipeline.
//!
//! Provides [`Dispatcher`], which runs health checks, selects endpoints by
//! priority, submits jobs through the session manager, falls back across
//! endpoints per job, and spills undeliverable jobs to the durable queue.

use std::time::Duration;

use sluice_core::SluiceError;

pub mod dispatcher;

pub use dispatcher::{DispatchOutcome, Dispatcher, ReplayOutcome};

/// Builds the shared HTTP client used for logins and submissions.
///
/// Connect and total timeouts are independent so a stalled read cannot hold
/// a dispatch cycle past the hard ceiling. The automatic cookie store stays
/// disabled; session cookies are attached explicitly by the session
/// manager.
pub fn build_http_client(
    connect_timeout: Duration,
    request_timeout: Duration,
) -> Result<reqwest::Client, SluiceError> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
        .map_err(|e| SluiceError::Internal(format!("failed to build HTTP client: {e}")))
}
