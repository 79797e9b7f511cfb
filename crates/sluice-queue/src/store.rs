// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable queue persistence with atomic writes.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sluice_core::{Job, SluiceError};
use tracing::{info, warn};

use crate::record::QueueRecord;

/// Persists undeliverable jobs to a single JSON file.
///
/// The file is owned by exactly one process at a time (enforced by the
/// deployment, not by this type). All writes are temp-file-plus-rename so
/// a crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct DurableQueue {
    path: PathBuf,
}

impl DurableQueue {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the current record. Returns `None` when no queue file exists.
    pub fn load(&self) -> Result<Option<QueueRecord>, SluiceError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                let record = serde_json::from_slice(&bytes).map_err(SluiceError::queue)?;
                Ok(Some(record))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SluiceError::queue(e)),
        }
    }

    /// Writes a record atomically: serialize into a temp file in the target
    /// directory, fsync, then rename over the queue path.
    pub fn save(&self, record: &QueueRecord) -> Result<(), SluiceError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(SluiceError::queue)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(SluiceError::queue)?;
        let bytes = serde_json::to_vec_pretty(record).map_err(SluiceError::queue)?;
        tmp.write_all(&bytes).map_err(SluiceError::queue)?;
        tmp.as_file().sync_all().map_err(SluiceError::queue)?;
        tmp.persist(&self.path)
            .map_err(|e| SluiceError::queue(e.error))?;
        Ok(())
    }

    /// Appends jobs to the on-disk record, creating it if absent.
    ///
    /// Merges with any existing record rather than overwriting, so multiple
    /// unavailability episodes accumulate. Jobs whose id is already present
    /// are not appended again; the id is the idempotency key and a job
    /// queued twice would only be delivered twice.
    pub fn enqueue(&self, reason: &str, jobs: &[Job]) -> Result<(), SluiceError> {
        let mut record = match self.load()? {
            Some(existing) => existing,
            None => QueueRecord::new(reason, Vec::new()),
        };

        let mut seen: HashSet<String> = record.jobs.iter().map(|j| j.id.clone()).collect();
        let mut appended = 0usize;
        for job in jobs {
            if seen.insert(job.id.clone()) {
                record.jobs.push(job.clone());
                appended += 1;
            } else {
                warn!(job = %job.id, "job already queued, not appending duplicate");
            }
        }

        record.saved_at = Utc::now();
        record.reason = reason.to_string();
        self.save(&record)?;

        info!(
            appended,
            total = record.jobs.len(),
            path = %self.path.display(),
            "jobs queued for later delivery"
        );
        Ok(())
    }

    /// Removes the queue file. Idempotent: clearing an absent queue is fine.
    pub fn clear(&self) -> Result<(), SluiceError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SluiceError::queue(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn queue_in(dir: &Path) -> DurableQueue {
        DurableQueue::new(dir.join("pending-jobs.json"))
    }

    #[test]
    fn load_absent_file_returns_none() {
        let dir = tempdir().unwrap();
        let queue = queue_in(dir.path());
        assert!(queue.load().unwrap().is_none());
    }

    #[test]
    fn enqueue_creates_file_with_jobs() {
        let dir = tempdir().unwrap();
        let queue = queue_in(dir.path());

        let jobs = vec![Job::new("uri-1"), Job::new("uri-2")];
        queue.enqueue("all endpoints unavailable", &jobs).unwrap();

        let record = queue.load().unwrap().unwrap();
        assert_eq!(record.reason, "all endpoints unavailable");
        assert_eq!(record.jobs.len(), 2);
        assert_eq!(record.jobs[0].id, "uri-1");
        assert_eq!(record.jobs[1].id, "uri-2");
    }

    #[test]
    fn enqueue_merges_episodes_without_clobbering() {
        let dir = tempdir().unwrap();
        let queue = queue_in(dir.path());

        queue.enqueue("episode one", &[Job::new("uri-1")]).unwrap();
        queue
            .enqueue("episode two", &[Job::new("uri-2"), Job::new("uri-3")])
            .unwrap();

        let record = queue.load().unwrap().unwrap();
        assert_eq!(record.reason, "episode two");
        let ids: Vec<&str> = record.jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["uri-1", "uri-2", "uri-3"]);
    }

    #[test]
    fn enqueue_does_not_duplicate_job_ids() {
        let dir = tempdir().unwrap();
        let queue = queue_in(dir.path());

        queue.enqueue("first", &[Job::new("uri-1")]).unwrap();
        queue
            .enqueue("second", &[Job::new("uri-1"), Job::new("uri-2")])
            .unwrap();

        let record = queue.load().unwrap().unwrap();
        assert_eq!(record.jobs.len(), 2);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let queue = queue_in(dir.path());

        let record = QueueRecord::new("replay remainder", vec![Job::new("uri-9")]);
        queue.save(&record).unwrap();

        let back = queue.load().unwrap().unwrap();
        assert_eq!(back.reason, "replay remainder");
        assert_eq!(back.jobs.len(), 1);
    }

    #[test]
    fn save_leaves_no_temp_residue() {
        let dir = tempdir().unwrap();
        let queue = queue_in(dir.path());
        queue.enqueue("test", &[Job::new("uri-1")]).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["pending-jobs.json"]);
    }

    #[test]
    fn save_replaces_previous_record_atomically() {
        let dir = tempdir().unwrap();
        let queue = queue_in(dir.path());

        queue
            .save(&QueueRecord::new("old", vec![Job::new("uri-1")]))
            .unwrap();
        queue
            .save(&QueueRecord::new("new", vec![Job::new("uri-2")]))
            .unwrap();

        let record = queue.load().unwrap().unwrap();
        assert_eq!(record.reason, "new");
        assert_eq!(record.jobs[0].id, "uri-2");
    }

    #[test]
    fn clear_removes_file_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let queue = queue_in(dir.path());

        queue.enqueue("test", &[Job::new("uri-1")]).unwrap();
        queue.clear().unwrap();
        assert!(queue.load().unwrap().is_none());

        // Clearing again must not fail.
        queue.clear().unwrap();
    }

    #[test]
    fn corrupted_file_surfaces_queue_error() {
        let dir = tempdir().unwrap();
        let queue = queue_in(dir.path());
        std::fs::write(queue.path(), b"{ not json").unwrap();

        let err = queue.load().unwrap_err();
        assert!(matches!(err, SluiceError::Queue { .. }));
    }

    #[test]
    fn save_creates_missing_parent_directory() {
        let dir = tempdir().unwrap();
        let queue = DurableQueue::new(dir.path().join("nested/deeper/pending-jobs.json"));
        queue.enqueue("test", &[Job::new("uri-1")]).unwrap();
        assert_eq!(queue.load().unwrap().unwrap().jobs.len(), 1);
    }
}
