// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for sluice integration tests.
//!
//! Provides [`StaticTunnelProbe`] to pin tunnel state in tests and
//! [`MockBackend`], a wiremock-backed simulation of the remote
//! job-processing backend (login, submission, version probe).

pub mod mock_backend;
pub mod mock_tunnel;

pub use mock_backend::{MockBackend, TEST_TOKEN};
pub use mock_tunnel::StaticTunnelProbe;
