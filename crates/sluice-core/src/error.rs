// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the sluice dispatch pipeline.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all sluice crates.
///
/// Network-level variants (`TunnelUnavailable`, `EndpointUnreachable`,
/// `AuthenticationRejected`, `SessionExpired`, `Timeout`) are absorbed by
/// the dispatcher's fallback loop and surface only as per-job diagnostic
/// strings. `Queue` is the one variant that produces a hard `Failed`
/// dispatch result, since it means a job could not even be durably
/// remembered.
#[derive(Debug, Error)]
pub enum SluiceError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The private tunnel gateway did not answer the liveness probe.
    #[error("tunnel unavailable: gateway {gateway} did not respond")]
    TunnelUnavailable { gateway: String },

    /// The endpoint could not be reached (connection failure, timeout, or a
    /// non-auth rejection of a request).
    #[error("endpoint {endpoint} unreachable: {message}")]
    EndpointUnreachable { endpoint: String, message: String },

    /// The login call itself was rejected (bad credentials, or the backend
    /// went down mid-login).
    #[error("authentication rejected by {endpoint}: {message}")]
    AuthenticationRejected { endpoint: String, message: String },

    /// A submission using a previously-valid session was rejected with an
    /// auth error even after one forced re-authentication.
    #[error("session expired on {endpoint} and re-authentication did not recover it")]
    SessionExpired { endpoint: String },

    /// Durable queue persistence failed.
    #[error("queue persistence failure: {source}")]
    Queue {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SluiceError {
    /// Wraps an I/O or serialization error as a queue persistence failure.
    pub fn queue(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Queue {
            source: Box::new(source),
        }
    }
}
