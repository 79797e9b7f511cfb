// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dispatch/failover loop.
//!
//! One [`Dispatcher::submit`] call is one dispatch cycle: endpoint health
//! is evaluated fresh (at most once per endpoint), the first healthy
//! endpoint by priority takes the whole batch, jobs that fail there are
//! retried against the remaining endpoints in priority order, and jobs
//! that exhaust every endpoint are appended to the durable queue. The
//! returned partition covers every input job exactly once.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use sluice_core::{DispatchResult, Endpoint, HealthState, Job, SluiceError};
use sluice_probe::EndpointProbe;
use sluice_queue::{DurableQueue, QueueRecord};
use sluice_session::{Session, SessionManager};
use tracing::{debug, error, info, warn};

/// Relative path of the backend's job submission endpoint.
const JOBS_ADD_PATH: &str = "/jobs/add";

/// Form field carrying the job id on submission.
const URI_FIELD: &str = "uri";

/// Reason string written to the queue when a batch exhausts all endpoints.
const EXHAUSTED_REASON: &str = "all endpoints unavailable";

/// Partitioned result of one `submit` call. Every input job id appears in
/// exactly one of the three lists.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub delivered: Vec<DispatchResult>,
    pub failed: Vec<DispatchResult>,
    pub queued: Vec<DispatchResult>,
}

impl DispatchOutcome {
    pub fn total(&self) -> usize {
        self.delivered.len() + self.failed.len() + self.queued.len()
    }
}

/// Result of one `replay_queue` call.
#[derive(Debug, Default)]
pub struct ReplayOutcome {
    pub delivered: Vec<DispatchResult>,
    pub still_queued: Vec<DispatchResult>,
}

/// How one submission attempt was rejected.
enum SubmitRejection {
    /// The backend rejected the request as unauthenticated.
    Auth(StatusCode),
    /// Anything else: transport error, timeout, non-auth failure status.
    Other(SluiceError),
}

/// Owns one dispatch pipeline: the ordered endpoint list, the probes, the
/// per-endpoint sessions, and the durable queue.
///
/// A single dispatcher instance owns its queue file; concurrent dispatchers
/// over the same file are prevented by the deployment, not by this type.
pub struct Dispatcher {
    endpoints: Vec<Endpoint>,
    probe: EndpointProbe,
    sessions: Arc<SessionManager>,
    queue: DurableQueue,
    client: reqwest::Client,
    inter_request_delay: Duration,
}

impl Dispatcher {
    pub fn new(
        mut endpoints: Vec<Endpoint>,
        probe: EndpointProbe,
        sessions: Arc<SessionManager>,
        queue: DurableQueue,
        client: reqwest::Client,
        inter_request_delay: Duration,
    ) -> Self {
        endpoints.sort_by_key(|e| e.priority);
        Self {
            endpoints,
            probe,
            sessions,
            queue,
            client,
            inter_request_delay,
        }
    }

    pub fn queue(&self) -> &DurableQueue {
        &self.queue
    }

    /// Dispatches a batch of jobs. Never raises network errors: the
    /// returned partition is the complete account of what happened, with
    /// per-job diagnostic strings for logging.
    pub async fn submit(&self, jobs: Vec<Job>) -> DispatchOutcome {
        if jobs.is_empty() {
            return DispatchOutcome::default();
        }

        let batch = jobs.len();
        let (delivered, remaining) = self.dispatch_pass(jobs).await;

        let mut outcome = DispatchOutcome {
            delivered,
            ..DispatchOutcome::default()
        };

        if !remaining.is_empty() {
            let undelivered: Vec<Job> = remaining.iter().map(|(job, _)| job.clone()).collect();
            match self.queue.enqueue(EXHAUSTED_REASON, &undelivered) {
                Ok(()) => {
                    for (job, last_error) in remaining {
                        outcome.queued.push(DispatchResult::queued(
                            job.id,
                            Some(last_error.unwrap_or_else(|| {
                                "no healthy endpoint available".to_string()
                            })),
                        ));
                    }
                }
                Err(e) => {
                    // The one hard-failure path: the job cannot even be
                    // durably remembered. This is real data loss risk.
                    error!(error = %e, "queue persistence failed, jobs could not be saved");
                    let message = e.to_string();
                    for (job, _) in remaining {
                        outcome.failed.push(DispatchResult::failed(job.id, message.clone()));
                    }
                }
            }
        }

        info!(
            batch,
            delivered = outcome.delivered.len(),
            queued = outcome.queued.len(),
            failed = outcome.failed.len(),
            "dispatch cycle finished"
        );
        outcome
    }

    /// Replays the durable queue through the normal dispatch pass, then
    /// writes back only the jobs that remain undelivered (or removes the
    /// record when none do).
    ///
    /// A write-back failure leaves the previous record intact on disk (the
    /// save is atomic), so no job is lost; already-delivered jobs would be
    /// resubmitted on the next replay, which is the documented
    /// at-least-once behavior.
    pub async fn replay_queue(&self) -> Result<ReplayOutcome, SluiceError> {
        let Some(record) = self.queue.load()? else {
            debug!("no queue file, nothing to replay");
            return Ok(ReplayOutcome::default());
        };
        if record.is_empty() {
            self.queue.clear()?;
            return Ok(ReplayOutcome::default());
        }

        info!(count = record.jobs.len(), "replaying durable queue");
        let (delivered, remaining) = self.dispatch_pass(record.jobs).await;

        let mut still_queued = Vec::new();
        if remaining.is_empty() {
            self.queue.clear()?;
        } else {
            let jobs: Vec<Job> = remaining.iter().map(|(job, _)| job.clone()).collect();
            self.queue
                .save(&QueueRecord::new("replay remainder", jobs))?;
            for (job, last_error) in remaining {
                still_queued.push(DispatchResult::queued(job.id, last_error));
            }
        }

        info!(
            delivered = delivered.len(),
            still_queued = still_queued.len(),
            "replay finished"
        );
        Ok(ReplayOutcome {
            delivered,
            still_queued,
        })
    }

    /// Runs the endpoint loop for one cycle: each endpoint is probed at
    /// most once, healthy endpoints take the remaining jobs sequentially,
    /// and failures carry over to the next endpoint in priority order.
    ///
    /// Returns delivered results plus the jobs no endpoint accepted, each
    /// paired with its last failure diagnostic.
    async fn dispatch_pass(
        &self,
        jobs: Vec<Job>,
    ) -> (Vec<DispatchResult>, Vec<(Job, Option<String>)>) {
        let mut delivered = Vec::new();
        let mut remaining: Vec<(Job, Option<String>)> =
            jobs.into_iter().map(|job| (job, None)).collect();

        for endpoint in &self.endpoints {
            if remaining.is_empty() {
                break;
            }

            let state = self.probe.check(endpoint).await;
            info!(endpoint = %endpoint.name, state = %state, "endpoint health");
            if state != HealthState::Healthy {
                debug!(endpoint = %endpoint.name, "skipping unhealthy endpoint");
                continue;
            }

            let mut still_failing = Vec::new();
            let mut first = true;
            for (job, _) in std::mem::take(&mut remaining) {
                // Pace submissions so a batch does not overwhelm the
                // backend; submissions on one endpoint share a session and
                // must stay sequential regardless.
                if !first && !self.inter_request_delay.is_zero() {
                    tokio::time::sleep(self.inter_request_delay).await;
                }
                first = false;

                match self.deliver(endpoint, &job).await {
                    Ok(()) => {
                        debug!(job = %job.id, endpoint = %endpoint.name, "job delivered");
                        delivered.push(DispatchResult::delivered(job.id, endpoint.name.clone()));
                    }
                    Err(e) => {
                        warn!(job = %job.id, endpoint = %endpoint.name, error = %e, "job failed on endpoint, will try next");
                        still_failing.push((job, Some(e.to_string())));
                    }
                }
            }
            remaining = still_failing;
        }

        (delivered, remaining)
    }

    /// Submits one job to one endpoint, applying the bounded
    /// re-authentication protocol: at most one forced re-login per job per
    /// endpoint, and none at all when the rejected session was freshly
    /// created in this same attempt.
    async fn deliver(&self, endpoint: &Endpoint, job: &Job) -> Result<(), SluiceError> {
        let ensured = self.sessions.ensure_session(endpoint).await?;

        match self.submit_once(endpoint, job, &ensured.session).await {
            Ok(()) => Ok(()),
            Err(SubmitRejection::Auth(status)) if !ensured.fresh => {
                // The cached session predates this attempt; assume it
                // expired and retry exactly once with a fresh login.
                warn!(
                    endpoint = %endpoint.name,
                    status = %status,
                    "submission rejected with stale session, re-authenticating once"
                );
                self.sessions.invalidate(&endpoint.name).await;
                let fresh = self.sessions.ensure_session(endpoint).await?;
                match self.submit_once(endpoint, job, &fresh.session).await {
                    Ok(()) => Ok(()),
                    Err(SubmitRejection::Auth(_)) => Err(SluiceError::SessionExpired {
                        endpoint: endpoint.name.clone(),
                    }),
                    Err(SubmitRejection::Other(e)) => Err(e),
                }
            }
            Err(SubmitRejection::Auth(status)) => Err(SluiceError::AuthenticationRejected {
                endpoint: endpoint.name.clone(),
                message: format!("submission rejected ({status}) with a fresh session"),
            }),
            Err(SubmitRejection::Other(e)) => Err(e),
        }
    }

    /// One wire submission: POST the job id plus its payload pairs,
    /// form-encoded, with the session cookie attached explicitly.
    async fn submit_once(
        &self,
        endpoint: &Endpoint,
        job: &Job,
        session: &Session,
    ) -> Result<(), SubmitRejection> {
        let url = endpoint.url(JOBS_ADD_PATH);
        let mut form: Vec<(&str, &str)> = vec![(URI_FIELD, job.id.as_str())];
        for (key, value) in &job.payload {
            form.push((key.as_str(), value.as_str()));
        }

        let req = self.client.post(&url).form(&form);
        let resp = self
            .sessions
            .attach(req, session)
            .send()
            .await
            .map_err(|e| {
                SubmitRejection::Other(SluiceError::EndpointUnreachable {
                    endpoint: endpoint.name.clone(),
                    message: format!("submission request failed: {e}"),
                })
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(SubmitRejection::Auth(status));
        }
        Err(SubmitRejection::Other(SluiceError::EndpointUnreachable {
            endpoint: endpoint.name.clone(),
            message: format!("submission returned {status}"),
        }))
    }
}
