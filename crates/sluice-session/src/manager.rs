// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session establishment and manual cookie propagation.
//!
//! The backend issues its session cookie with `SameSite=Strict`, which
//! prevents a standard HTTP client's implicit cookie jar from re-attaching
//! it on subsequent requests to an IP-addressed, cross-context host. The
//! manager therefore extracts the token from the raw `Set-Cookie` response
//! header at login and sets the `Cookie` header explicitly on every
//! authenticated request.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use sluice_core::{Endpoint, SluiceError};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Relative path of the backend's login endpoint.
const LOGIN_PATH: &str = "/auth/login";

/// Body marker the backend sends on successful login. A 2xx response
/// without this marker means the credentials were rejected.
const LOGIN_OK_MARKER: &str = "Ok.";

/// Name of the session cookie issued by the backend.
const TOKEN_COOKIE: &str = "TOKEN";

/// A live authenticated session with one backend endpoint.
#[derive(Debug, Clone)]
pub struct Session {
    pub endpoint: String,
    pub token: String,
    pub established_at: DateTime<Utc>,
}

/// Outcome of [`SessionManager::ensure_session`]: the session plus whether
/// it was created by this very call (`fresh`) or served from the
/// per-endpoint cache. Callers use `fresh` to bound the re-authentication
/// protocol: a rejection on a fresh session is a hard failure, never
/// another login.
#[derive(Debug, Clone)]
pub struct EnsuredSession {
    pub session: Session,
    pub fresh: bool,
}

/// Owns at most one live [`Session`] per endpoint.
///
/// Sessions are created by `ensure_session`, dropped by `invalidate`, and
/// never used after invalidation without a fresh login (the cache is the
/// only source of tokens).
pub struct SessionManager {
    client: reqwest::Client,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionManager {
    /// Creates a manager around an existing HTTP client. The client's
    /// cookie jar is never relied upon; timeouts are the client's own.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached session for the endpoint, or logs in to create
    /// one. Holding the cache lock across the login serializes concurrent
    /// callers so an endpoint never ends up with two live sessions.
    pub async fn ensure_session(&self, endpoint: &Endpoint) -> Result<EnsuredSession, SluiceError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(&endpoint.name) {
            return Ok(EnsuredSession {
                session: session.clone(),
                fresh: false,
            });
        }

        let session = self.login(endpoint).await?;
        sessions.insert(endpoint.name.clone(), session.clone());
        Ok(EnsuredSession {
            session,
            fresh: true,
        })
    }

    /// Drops the session for the endpoint. The next `ensure_session`
    /// re-authenticates from scratch.
    pub async fn invalidate(&self, endpoint_name: &str) {
        if self.sessions.lock().await.remove(endpoint_name).is_some() {
            warn!(endpoint = endpoint_name, "session invalidated");
        }
    }

    /// Attaches the session cookie to an outgoing request.
    pub fn attach(
        &self,
        req: reqwest::RequestBuilder,
        session: &Session,
    ) -> reqwest::RequestBuilder {
        req.header(COOKIE, format!("{TOKEN_COOKIE}={}", session.token))
    }

    async fn login(&self, endpoint: &Endpoint) -> Result<Session, SluiceError> {
        let url = endpoint.url(LOGIN_PATH);
        let form = [
            ("username", endpoint.credentials.username.as_str()),
            ("password", endpoint.credentials.password.as_str()),
        ];

        let resp = self.client.post(&url).form(&form).send().await.map_err(|e| {
            SluiceError::EndpointUnreachable {
                endpoint: endpoint.name.clone(),
                message: format!("login request failed: {e}"),
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SluiceError::AuthenticationRejected {
                endpoint: endpoint.name.clone(),
                message: format!("login returned {status}"),
            });
        }

        // Read the token before the body consumes the response.
        let token = extract_token(resp.headers());

        let body = resp
            .text()
            .await
            .map_err(|e| SluiceError::EndpointUnreachable {
                endpoint: endpoint.name.clone(),
                message: format!("failed to read login response: {e}"),
            })?;

        if !body.contains(LOGIN_OK_MARKER) {
            return Err(SluiceError::AuthenticationRejected {
                endpoint: endpoint.name.clone(),
                message: "login response missing success marker".into(),
            });
        }

        let token = token.ok_or_else(|| SluiceError::AuthenticationRejected {
            endpoint: endpoint.name.clone(),
            message: format!("no {TOKEN_COOKIE} cookie in login response"),
        })?;

        debug!(endpoint = %endpoint.name, "session established");
        Ok(Session {
            endpoint: endpoint.name.clone(),
            token,
            established_at: Utc::now(),
        })
    }
}

/// Extracts the session token from raw `Set-Cookie` headers by pattern
/// match on `TOKEN=<value>`, ignoring cookie attributes after the first
/// `;`.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    for value in headers.get_all(SET_COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        if let Some(rest) = raw.strip_prefix(TOKEN_COOKIE)
            && let Some(rest) = rest.strip_prefix('=')
        {
            let token = rest.split(';').next().unwrap_or(rest).trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}
