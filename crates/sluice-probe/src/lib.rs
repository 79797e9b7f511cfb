// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Health probing for the sluice dispatch pipeline.
//!
//! Provides [`PingTunnelProbe`] for tunnel liveness (a single ICMP echo to
//! the configured gateway) and [`EndpointProbe`] for per-endpoint health
//! states, both recomputed fresh each dispatch cycle.

pub mod endpoint;
pub mod tunnel;

pub use endpoint::EndpointProbe;
pub use tunnel::PingTunnelProbe;
