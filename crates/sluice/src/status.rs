// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sluice status` command implementation.
//!
//! Prints the durable queue state without touching the network, so it is
//! safe to run while the tunnel is down.

use sluice_config::SluiceConfig;
use sluice_core::SluiceError;
use sluice_queue::DurableQueue;

/// Runs the `sluice status` command. Returns the process exit code.
pub fn run_status(config: &SluiceConfig) -> Result<i32, SluiceError> {
    let queue = DurableQueue::new(&config.queue.path);

    match queue.load()? {
        None => {
            println!("queue empty ({})", config.queue.path);
        }
        Some(record) if record.is_empty() => {
            println!("queue empty ({})", config.queue.path);
        }
        Some(record) => {
            println!(
                "{} job(s) pending in {} (saved {}, reason: {})",
                record.jobs.len(),
                config.queue.path,
                record.saved_at.format("%Y-%m-%d %H:%M:%S UTC"),
                record.reason
            );
            for job in &record.jobs {
                println!("  {}", job.id);
            }
        }
    }
    Ok(0)
}
