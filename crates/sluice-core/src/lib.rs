// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the sluice dispatch pipeline.
//!
//! This crate provides the shared types (jobs, endpoints, health states,
//! dispatch results), the error taxonomy, and the tunnel-probe trait seam
//! used throughout the sluice workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SluiceError;
pub use traits::TunnelProbe;
pub use types::{
    Credentials, DispatchResult, DispatchStatus, Endpoint, HealthState, Job,
};
