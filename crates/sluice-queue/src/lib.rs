// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk durable queue for jobs that could not be delivered.
//!
//! The queue is a single JSON file owned by one process at a time. Writes
//! go through a temp file in the same directory followed by an atomic
//! rename, so an interruption mid-write never corrupts a previously-valid
//! record.

pub mod record;
pub mod store;

pub use record::QueueRecord;
pub use store::DurableQueue;
