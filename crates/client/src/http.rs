// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP client for the telemetry backend.
//!
//! One delivery is one session: `POST auth/login` for a bearer token, one
//! `POST collection/metrics`, one `POST collection/annotations` when the
//! batch is non-empty, and `POST auth/logout` released on every exit path.
//! Logout failures are logged at debug and never escalated; the records
//! were already accepted by then.

use async_trait::async_trait;
use buildwatch_core::{AnnotationRecord, MetricRecord};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SinkError};
use crate::sink::TelemetrySink;

const LOGIN_PATH: &str = "auth/login";
const LOGOUT_PATH: &str = "auth/logout";
const METRICS_PATH: &str = "collection/metrics";
const ANNOTATIONS_PATH: &str = "collection/annotations";

/// Cap on the response body carried inside an API error.
const ERROR_BODY_LIMIT: usize = 512;

/// Cap an error body at [`ERROR_BODY_LIMIT`] bytes, cutting on a char
/// boundary so a multibyte body cannot panic the error path itself.
fn truncate_body(mut body: String) -> String {
    if body.len() > ERROR_BODY_LIMIT {
        let mut end = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// An authenticated session with the backend.
struct Session {
    token: String,
}

/// HTTP implementation of [`TelemetrySink`].
#[derive(Clone)]
pub struct HttpTelemetryClient {
    endpoint: String,
    username: String,
    password: String,
    http: reqwest::Client,
}

// Credentials must never leak into logs.
impl std::fmt::Debug for HttpTelemetryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTelemetryClient")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl HttpTelemetryClient {
    /// Create a client for `endpoint` with username/password credentials.
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let endpoint = endpoint.into();
        HttpTelemetryClient {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    fn request_error(&self, err: reqwest::Error) -> SinkError {
        if err.is_connect() {
            SinkError::UnknownHost(self.endpoint.clone())
        } else {
            SinkError::Transport(err)
        }
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SinkError::TokenExpired);
        }
        if !status.is_success() {
            let message = truncate_body(response.text().await.unwrap_or_default());
            return Err(SinkError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn login(&self) -> Result<Session> {
        let response = self
            .http
            .post(self.url(LOGIN_PATH))
            .json(&LoginRequest {
                username: &self.username,
                password: &self.password,
            })
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let response = Self::checked(response).await?;
        let body: LoginResponse = response.json().await.map_err(SinkError::Transport)?;
        Ok(Session { token: body.token })
    }

    async fn logout(&self, session: &Session) {
        let result = self
            .http
            .post(self.url(LOGOUT_PATH))
            .bearer_auth(&session.token)
            .send()
            .await;
        if let Err(err) = result {
            debug!(error = %err, "telemetry logout failed");
        }
    }

    async fn post_records<T: Serialize>(&self, session: &Session, path: &str, records: &[T]) -> Result<()> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&session.token)
            .json(records)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        Self::checked(response).await?;
        Ok(())
    }

    async fn push_in_session(
        &self,
        session: &Session,
        metrics: &[MetricRecord],
        annotations: &[AnnotationRecord],
    ) -> Result<()> {
        self.post_records(session, METRICS_PATH, metrics).await?;
        if !annotations.is_empty() {
            self.post_records(session, ANNOTATIONS_PATH, annotations)
                .await?;
        }
        Ok(())
    }

    /// Push metrics and annotations sharing one authenticated session.
    /// The session is released on every exit path.
    pub async fn deliver(
        &self,
        metrics: &[MetricRecord],
        annotations: &[AnnotationRecord],
    ) -> Result<()> {
        let session = self.login().await?;
        let result = self.push_in_session(&session, metrics, annotations).await;
        self.logout(&session).await;
        if result.is_ok() {
            info!(
                metrics = metrics.len(),
                annotations = annotations.len(),
                "sent telemetry to backend"
            );
        }
        result
    }

    /// Verify the endpoint and credentials with a login/logout round trip.
    pub async fn check_connection(&self) -> Result<()> {
        let session = self.login().await?;
        self.logout(&session).await;
        Ok(())
    }
}

#[async_trait]
impl TelemetrySink for HttpTelemetryClient {
    async fn push_metrics(&self, metrics: &[MetricRecord]) -> Result<()> {
        let session = self.login().await?;
        let result = self.post_records(&session, METRICS_PATH, metrics).await;
        self.logout(&session).await;
        result
    }

    async fn push_annotations(&self, annotations: &[AnnotationRecord]) -> Result<()> {
        if annotations.is_empty() {
            return Ok(());
        }
        let session = self.login().await?;
        let result = self
            .post_records(&session, ANNOTATIONS_PATH, annotations)
            .await;
        self.logout(&session).await;
        result
    }

    // One session for both lists, not one per batch.
    async fn deliver(
        &self,
        metrics: &[MetricRecord],
        annotations: &[AnnotationRecord],
    ) -> Result<()> {
        HttpTelemetryClient::deliver(self, metrics, annotations).await
    }
}
