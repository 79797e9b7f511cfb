// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend session management for the sluice dispatch pipeline.
//!
//! Provides [`SessionManager`], which authenticates against backend
//! endpoints and owns the per-endpoint credential token, including forced
//! re-authentication after session loss.

pub mod manager;

pub use manager::{EnsuredSession, Session, SessionManager};
