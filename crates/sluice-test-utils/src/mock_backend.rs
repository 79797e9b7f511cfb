// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A wiremock-backed simulation of the remote job-processing backend.

use sluice_core::{Credentials, Endpoint};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Session token issued by [`MockBackend::mount_login_ok`] by default.
pub const TEST_TOKEN: &str = "t0ken-test";

/// One mock backend instance: a wiremock server plus helpers that mount
/// the wire surface the dispatcher talks to (`/auth/login`, `/jobs/add`,
/// `/app/version`). Tests mount extra or overriding mocks directly on
/// [`server`](Self::server) for failure scenarios.
pub struct MockBackend {
    pub server: MockServer,
}

impl MockBackend {
    /// Starts a backend with nothing mounted.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Starts a fully healthy backend: version probe, login, and
    /// submission all succeed.
    pub async fn healthy() -> Self {
        let backend = Self::start().await;
        backend.mount_version_ok().await;
        backend.mount_login_ok(TEST_TOKEN).await;
        backend.mount_add_ok().await;
        backend
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Builds an [`Endpoint`] pointing at this backend.
    pub fn endpoint(&self, name: &str, priority: u8) -> Endpoint {
        Endpoint {
            name: name.into(),
            base_url: self.uri(),
            priority,
            credentials: Credentials {
                username: "admin".into(),
                password: "secret".into(),
            },
            requires_tunnel: false,
        }
    }

    /// Builds a tunnel-gated [`Endpoint`] pointing at this backend.
    pub fn tunnel_gated_endpoint(&self, name: &str, priority: u8) -> Endpoint {
        let mut endpoint = self.endpoint(name, priority);
        endpoint.requires_tunnel = true;
        endpoint
    }

    /// An endpoint nothing listens on: connection refused immediately.
    pub fn unreachable_endpoint(name: &str, priority: u8) -> Endpoint {
        Endpoint {
            name: name.into(),
            base_url: "http://127.0.0.1:1".into(),
            priority,
            credentials: Credentials {
                username: "admin".into(),
                password: "secret".into(),
            },
            requires_tunnel: false,
        }
    }

    pub async fn mount_version_ok(&self) {
        Mock::given(method("GET"))
            .and(path("/app/version"))
            .respond_with(ResponseTemplate::new(200).set_body_string("v4.6.1"))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_login_ok(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(
                        "set-cookie",
                        format!("TOKEN={token}; HttpOnly; SameSite=Strict").as_str(),
                    )
                    .set_body_string("Ok."),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mount_add_ok(&self) {
        Mock::given(method("POST"))
            .and(path("/jobs/add"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.server)
            .await;
    }

    /// Mounts a submission endpoint that always answers with `status`.
    pub async fn mount_add_status(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/jobs/add"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}
