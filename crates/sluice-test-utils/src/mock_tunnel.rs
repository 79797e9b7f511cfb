// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tunnel probe doubles with pinned or scripted state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sluice_core::TunnelProbe;

/// A tunnel probe pinned to a fixed up/down state, flippable mid-test.
#[derive(Debug, Clone)]
pub struct StaticTunnelProbe {
    up: Arc<AtomicBool>,
}

impl StaticTunnelProbe {
    pub fn up() -> Self {
        Self {
            up: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn down() -> Self {
        Self {
            up: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flips the tunnel state for subsequent probes.
    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }
}

#[async_trait]
impl TunnelProbe for StaticTunnelProbe {
    async fn is_up(&self, _timeout: Duration) -> bool {
        self.up.load(Ordering::SeqCst)
    }
}
