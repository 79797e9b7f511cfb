// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the dispatch/failover loop against mock backends.
//!
//! Each test assembles an isolated dispatcher with a temp queue file and
//! wiremock-backed backends. Tests are independent and order-insensitive.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sluice_core::{DispatchStatus, Endpoint, Job, TunnelProbe};
use sluice_dispatch::{build_http_client, DispatchOutcome, Dispatcher};
use sluice_probe::EndpointProbe;
use sluice_queue::DurableQueue;
use sluice_session::SessionManager;
use sluice_test_utils::{MockBackend, StaticTunnelProbe};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

fn dispatcher(
    endpoints: Vec<Endpoint>,
    tunnel: Option<Arc<dyn TunnelProbe>>,
    queue_path: PathBuf,
) -> Dispatcher {
    let client = build_http_client(Duration::from_secs(2), Duration::from_secs(5)).unwrap();
    Dispatcher::new(
        endpoints,
        EndpointProbe::new(tunnel, Duration::from_secs(2)).unwrap(),
        Arc::new(SessionManager::new(client.clone())),
        DurableQueue::new(queue_path),
        client,
        Duration::ZERO,
    )
}

fn jobs(n: usize) -> Vec<Job> {
    (0..n)
        .map(|i| Job::new(format!("magnet:?xt=urn:btih:{i:040}")).with_param("category", "tv"))
        .collect()
}

fn job_ids(jobs: &[Job]) -> HashSet<String> {
    jobs.iter().map(|j| j.id.clone()).collect()
}

fn assert_exact_partition(outcome: &DispatchOutcome, input: &[Job]) {
    let mut seen = HashSet::new();
    for result in outcome
        .delivered
        .iter()
        .chain(&outcome.failed)
        .chain(&outcome.queued)
    {
        assert!(
            seen.insert(result.job_id.clone()),
            "job id {} appears in more than one partition",
            result.job_id
        );
    }
    assert_eq!(seen, job_ids(input), "partition must cover exactly the input");
}

// ---- Scenario A: primary healthy, secondary unconfigured ----

#[tokio::test]
async fn scenario_a_primary_healthy_delivers_all() {
    let backend = MockBackend::healthy().await;
    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(
        vec![backend.endpoint("primary", 0)],
        None,
        dir.path().join("pending-jobs.json"),
    );

    let input = jobs(10);
    let outcome = dispatcher.submit(input.clone()).await;

    assert_eq!(outcome.delivered.len(), 10);
    assert!(outcome.failed.is_empty());
    assert!(outcome.queued.is_empty());
    assert!(outcome
        .delivered
        .iter()
        .all(|r| r.endpoint_used.as_deref() == Some("primary")));
    assert_exact_partition(&outcome, &input);
    assert!(dispatcher.queue().load().unwrap().is_none());
}

// ---- Priority property: secondary never contacted while primary is healthy ----

#[tokio::test]
async fn healthy_primary_means_secondary_never_contacted() {
    let primary = MockBackend::healthy().await;
    let secondary = MockBackend::start().await;
    // Any request reaching the secondary fails the test.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&secondary.server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&secondary.server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(
        vec![primary.endpoint("primary", 0), secondary.endpoint("secondary", 1)],
        None,
        dir.path().join("pending-jobs.json"),
    );

    let outcome = dispatcher.submit(jobs(5)).await;
    assert_eq!(outcome.delivered.len(), 5);
}

// ---- Scenario B: primary tunnel-down, secondary healthy ----

#[tokio::test]
async fn scenario_b_tunnel_down_fails_over_to_secondary() {
    let primary = MockBackend::start().await;
    // The tunnel is down, so the primary must never even be probed.
    Mock::given(method("GET"))
        .and(path("/app/version"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&primary.server)
        .await;

    let secondary = MockBackend::healthy().await;

    let dir = tempfile::tempdir().unwrap();
    let tunnel: Arc<dyn TunnelProbe> = Arc::new(StaticTunnelProbe::down());
    let dispatcher = dispatcher(
        vec![
            primary.tunnel_gated_endpoint("primary", 0),
            secondary.endpoint("secondary", 1),
        ],
        Some(tunnel),
        dir.path().join("pending-jobs.json"),
    );

    let input = jobs(10);
    let outcome = dispatcher.submit(input.clone()).await;

    assert_eq!(outcome.delivered.len(), 10);
    assert!(outcome
        .delivered
        .iter()
        .all(|r| r.endpoint_used.as_deref() == Some("secondary")));
    assert_exact_partition(&outcome, &input);
}

// ---- Non-auth submission failure falls through to the next endpoint ----

#[tokio::test]
async fn submission_failure_on_primary_falls_over_to_secondary() {
    let primary = MockBackend::start().await;
    primary.mount_version_ok().await;
    primary.mount_login_ok("pri-token").await;
    primary.mount_add_status(500).await;

    let secondary = MockBackend::healthy().await;

    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(
        vec![primary.endpoint("primary", 0), secondary.endpoint("secondary", 1)],
        None,
        dir.path().join("pending-jobs.json"),
    );

    let outcome = dispatcher.submit(jobs(3)).await;
    assert_eq!(outcome.delivered.len(), 3);
    assert!(outcome
        .delivered
        .iter()
        .all(|r| r.endpoint_used.as_deref() == Some("secondary")));
}

// ---- Scenario C: every endpoint unreachable ----

#[tokio::test]
async fn scenario_c_all_unreachable_queues_everything() {
    let dir = tempfile::tempdir().unwrap();
    let queue_path = dir.path().join("pending-jobs.json");
    let dispatcher = dispatcher(
        vec![
            MockBackend::unreachable_endpoint("primary", 0),
            MockBackend::unreachable_endpoint("secondary", 1),
        ],
        None,
        queue_path.clone(),
    );

    let input = jobs(10);
    let outcome = dispatcher.submit(input.clone()).await;

    assert_eq!(outcome.queued.len(), 10);
    assert!(outcome.delivered.is_empty());
    assert!(outcome.failed.is_empty());
    assert_exact_partition(&outcome, &input);

    // The on-disk record contains exactly the input job ids.
    let record = DurableQueue::new(queue_path).load().unwrap().unwrap();
    assert_eq!(job_ids(&record.jobs), job_ids(&input));
}

// ---- Scenario D: replay after recovery ----

#[tokio::test]
async fn scenario_d_replay_drains_queue_once_endpoint_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let queue_path = dir.path().join("pending-jobs.json");

    // Seed the queue as an earlier exhausted cycle would have.
    let input = jobs(10);
    DurableQueue::new(queue_path.clone())
        .enqueue("all endpoints unavailable", &input)
        .unwrap();

    let backend = MockBackend::healthy().await;
    let dispatcher = dispatcher(
        vec![backend.endpoint("primary", 0)],
        None,
        queue_path.clone(),
    );

    let outcome = dispatcher.replay_queue().await.unwrap();
    assert_eq!(outcome.delivered.len(), 10);
    assert!(outcome.still_queued.is_empty());
    assert!(DurableQueue::new(queue_path).load().unwrap().is_none());

    // Replaying an empty queue is a no-op.
    let again = dispatcher.replay_queue().await.unwrap();
    assert!(again.delivered.is_empty());
    assert!(again.still_queued.is_empty());
}

#[tokio::test]
async fn replay_keeps_undelivered_remainder_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let queue_path = dir.path().join("pending-jobs.json");
    DurableQueue::new(queue_path.clone())
        .enqueue("all endpoints unavailable", &jobs(4))
        .unwrap();

    // Still nothing reachable: replay must leave all four queued.
    let dispatcher = dispatcher(
        vec![MockBackend::unreachable_endpoint("primary", 0)],
        None,
        queue_path.clone(),
    );

    let outcome = dispatcher.replay_queue().await.unwrap();
    assert!(outcome.delivered.is_empty());
    assert_eq!(outcome.still_queued.len(), 4);

    let record = DurableQueue::new(queue_path).load().unwrap().unwrap();
    assert_eq!(record.jobs.len(), 4);
}

// ---- Bounded re-authentication ----

#[tokio::test]
async fn stale_session_triggers_exactly_one_reauth() {
    let backend = MockBackend::start().await;
    backend.mount_version_ok().await;

    // Exactly two logins: the initial one and the single forced re-auth.
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "TOKEN=abc; HttpOnly; SameSite=Strict")
                .set_body_string("Ok."),
        )
        .expect(2)
        .mount(&backend.server)
        .await;

    // First submission succeeds (warming the session cache); every
    // submission after that is rejected as unauthenticated.
    Mock::given(method("POST"))
        .and(path("/jobs/add"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/jobs/add"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&backend.server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(
        vec![backend.endpoint("primary", 0)],
        None,
        dir.path().join("pending-jobs.json"),
    );

    // Warm the session.
    let first = dispatcher.submit(vec![Job::new("uri-warm")]).await;
    assert_eq!(first.delivered.len(), 1);

    // Cached session is now rejected: one re-auth, one retry, then the job
    // falls through to the queue. The mock expectations above verify the
    // exact wire counts on drop.
    let second = dispatcher.submit(vec![Job::new("uri-expired")]).await;
    assert!(second.delivered.is_empty());
    assert_eq!(second.queued.len(), 1);
    let diag = second.queued[0].error.as_deref().unwrap();
    assert!(diag.contains("session expired"), "got: {diag}");
}

#[tokio::test]
async fn rejection_on_fresh_session_is_not_retried() {
    let backend = MockBackend::start().await;
    backend.mount_version_ok().await;

    // One login only: a rejection right after a fresh login must not
    // trigger another authentication round.
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "TOKEN=abc; HttpOnly")
                .set_body_string("Ok."),
        )
        .expect(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/jobs/add"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&backend.server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(
        vec![backend.endpoint("primary", 0)],
        None,
        dir.path().join("pending-jobs.json"),
    );

    let outcome = dispatcher.submit(vec![Job::new("uri-1")]).await;
    assert!(outcome.delivered.is_empty());
    assert_eq!(outcome.queued.len(), 1);
}

// ---- Partition property with mixed outcomes ----

#[tokio::test]
async fn mixed_outcomes_partition_exactly() {
    let backend = MockBackend::start().await;
    backend.mount_version_ok().await;
    backend.mount_login_ok("tok").await;

    // One poisoned job is always rejected with a non-auth failure; mounted
    // first so it takes precedence over the generic success mock.
    Mock::given(method("POST"))
        .and(path("/jobs/add"))
        .and(body_string_contains("poisoned"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&backend.server)
        .await;
    backend.mount_add_ok().await;

    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(
        vec![backend.endpoint("primary", 0)],
        None,
        dir.path().join("pending-jobs.json"),
    );

    let mut input = jobs(9);
    input.push(Job::new("magnet:?xt=urn:btih:poisoned"));
    let outcome = dispatcher.submit(input.clone()).await;

    assert_eq!(outcome.delivered.len(), 9);
    assert_eq!(outcome.queued.len(), 1);
    assert_eq!(outcome.queued[0].job_id, "magnet:?xt=urn:btih:poisoned");
    assert_exact_partition(&outcome, &input);
}

// ---- Queue persistence failure is the only hard-failed path ----

#[tokio::test]
async fn queue_write_failure_marks_jobs_failed() {
    let dir = tempfile::tempdir().unwrap();
    // Make the queue's parent "directory" a regular file so the write fails.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let dispatcher = dispatcher(
        vec![MockBackend::unreachable_endpoint("primary", 0)],
        None,
        blocker.join("pending-jobs.json"),
    );

    let input = jobs(3);
    let outcome = dispatcher.submit(input.clone()).await;

    assert_eq!(outcome.failed.len(), 3);
    assert!(outcome.queued.is_empty());
    assert!(outcome
        .failed
        .iter()
        .all(|r| r.status == DispatchStatus::Failed && r.error.is_some()));
    assert_exact_partition(&outcome, &input);
}

// ---- Auth-rejecting endpoint is unhealthy for the whole cycle ----

#[tokio::test]
async fn auth_rejected_probe_skips_endpoint() {
    let backend = MockBackend::start().await;
    Mock::given(method("GET"))
        .and(path("/app/version"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&backend.server)
        .await;
    // No login or submission may reach an endpoint probed as AuthRejected.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend.server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(
        vec![backend.endpoint("primary", 0)],
        None,
        dir.path().join("pending-jobs.json"),
    );

    let outcome = dispatcher.submit(jobs(2)).await;
    assert_eq!(outcome.queued.len(), 2);
}

// ---- Queued jobs from separate episodes accumulate ----

#[tokio::test]
async fn consecutive_exhausted_cycles_accumulate_in_queue() {
    let dir = tempfile::tempdir().unwrap();
    let queue_path = dir.path().join("pending-jobs.json");
    let dispatcher = dispatcher(
        vec![MockBackend::unreachable_endpoint("primary", 0)],
        None,
        queue_path.clone(),
    );

    dispatcher.submit(vec![Job::new("uri-episode-1")]).await;
    dispatcher.submit(vec![Job::new("uri-episode-2")]).await;

    let record = DurableQueue::new(queue_path).load().unwrap().unwrap();
    let ids: Vec<&str> = record.jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["uri-episode-1", "uri-episode-2"]);
}
