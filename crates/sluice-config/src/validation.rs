// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as parseable gateway addresses, http(s) endpoint URLs,
//! and non-zero timeouts.

use crate::diagnostic::ConfigError;
use crate::model::{EndpointConfig, SluiceConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors (does not fail fast).
pub fn validate_config(config: &SluiceConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate gateway is a parseable IP address when set
    if let Some(gateway) = &config.tunnel.gateway
        && gateway.trim().parse::<std::net::IpAddr>().is_err()
    {
        errors.push(ConfigError::Validation {
            message: format!("tunnel.gateway `{gateway}` is not a valid IP address"),
        });
    }

    if config.tunnel.probe_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "tunnel.probe_timeout_ms must be non-zero".to_string(),
        });
    }

    if config.tunnel.reconnect_poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "tunnel.reconnect_poll_interval_secs must be non-zero".to_string(),
        });
    }

    // Validate endpoint sections
    if let Some(primary) = &config.primary {
        validate_endpoint("primary", primary, &mut errors);
    }
    if let Some(secondary) = &config.secondary {
        validate_endpoint("secondary", secondary, &mut errors);
    }

    // Validate queue path is not empty
    if config.queue.path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "queue.path must not be empty".to_string(),
        });
    }

    // Validate HTTP timeouts are non-zero
    if config.http.connect_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "http.connect_timeout_secs must be non-zero".to_string(),
        });
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "http.request_timeout_secs must be non-zero".to_string(),
        });
    }

    // Validate dispatch settings
    if config.dispatch.max_batch_size == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatch.max_batch_size must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_endpoint(section: &str, endpoint: &EndpointConfig, errors: &mut Vec<ConfigError>) {
    let url = endpoint.url.trim();
    if url.is_empty() {
        errors.push(ConfigError::Validation {
            message: format!("{section}.url must not be empty"),
        });
    } else if !url.starts_with("http://") && !url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("{section}.url `{url}` must start with http:// or https://"),
        });
    }

    if endpoint.username.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: format!("{section}.username must not be empty"),
        });
    }
}
