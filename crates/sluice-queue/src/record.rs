// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The on-disk queue record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sluice_core::Job;

/// The durable representation of jobs awaiting redelivery.
///
/// Created (or appended to) when no endpoint could accept a batch, shrunk
/// by replay, and removed entirely once every contained job has been
/// redelivered. Operators may read the file directly to resubmit jobs by
/// hand; the field names below are a stable contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueRecord {
    pub saved_at: DateTime<Utc>,
    pub reason: String,
    pub jobs: Vec<Job>,
}

impl QueueRecord {
    pub fn new(reason: impl Into<String>, jobs: Vec<Job>) -> Self {
        Self {
            saved_at: Utc::now(),
            reason: reason.into(),
            jobs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
