// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `sluice submit` command implementation.
//!
//! Reads a JSON array of jobs, chunks it by the configured batch size, and
//! dispatches each chunk. A non-empty queued partition is an expected
//! operating condition, reported as informational status with recovery
//! instructions rather than a failure.

use std::path::Path;

use sluice_config::SluiceConfig;
use sluice_core::{Job, SluiceError};
use sluice_dispatch::DispatchOutcome;
use tracing::info;

use crate::runtime;

/// Runs the `sluice submit` command. Returns the process exit code: zero
/// unless a job could not even be durably queued.
pub async fn run_submit(config: &SluiceConfig, file: &Path) -> Result<i32, SluiceError> {
    let jobs = read_jobs(file)?;
    if jobs.is_empty() {
        println!("no jobs in {}", file.display());
        return Ok(0);
    }

    info!(count = jobs.len(), file = %file.display(), "submitting jobs");
    let dispatcher = runtime::build_dispatcher(config)?;

    let mut totals = DispatchOutcome::default();
    for chunk in jobs.chunks(config.dispatch.max_batch_size) {
        let outcome = dispatcher.submit(chunk.to_vec()).await;
        totals.delivered.extend(outcome.delivered);
        totals.failed.extend(outcome.failed);
        totals.queued.extend(outcome.queued);
    }

    print_summary(&totals, &config.queue.path);
    Ok(if totals.failed.is_empty() { 0 } else { 1 })
}

fn print_summary(outcome: &DispatchOutcome, queue_path: &str) {
    for result in &outcome.delivered {
        println!(
            "delivered  {}  via {}",
            result.job_id,
            result.endpoint_used.as_deref().unwrap_or("?")
        );
    }
    for result in &outcome.failed {
        eprintln!(
            "FAILED     {}  {}",
            result.job_id,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!(
        "{} delivered, {} queued, {} failed",
        outcome.delivered.len(),
        outcome.queued.len(),
        outcome.failed.len()
    );

    if !outcome.queued.is_empty() {
        println!(
            "{} job(s) were saved to {queue_path} because no backend was reachable.",
            outcome.queued.len()
        );
        println!("They will be redelivered by `sluice replay` once a backend is back.");
    }
    if !outcome.failed.is_empty() {
        eprintln!(
            "{} job(s) could NOT be saved to the queue and may be lost; see errors above.",
            outcome.failed.len()
        );
    }
}

/// Reads a JSON array of jobs from disk.
fn read_jobs(path: &Path) -> Result<Vec<Job>, SluiceError> {
    let bytes = std::fs::read(path).map_err(|e| {
        SluiceError::Config(format!("cannot read jobs file {}: {e}", path.display()))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        SluiceError::Config(format!(
            "jobs file {} is not a JSON array of jobs: {e}",
            path.display()
        ))
    })
}
