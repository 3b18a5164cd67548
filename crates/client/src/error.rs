// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Sink error taxonomy.

use thiserror::Error;

/// Errors that can occur when talking to the telemetry backend.
///
/// The taxonomy drives log severity at the orchestration boundary: an
/// expired or rejected credential is a warning, an unreachable host is an
/// error with an actionable message, everything else is a generic error.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The backend rejected the credentials or the session token expired.
    #[error("telemetry credentials rejected or token expired")]
    TokenExpired,

    /// The backend host could not be reached.
    #[error("telemetry host not found: check the endpoint configuration or your network ({0})")]
    UnknownHost(String),

    /// The backend answered with a non-success status.
    #[error("telemetry API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Response body, truncated.
        message: String,
    },

    /// Transport-level failure.
    #[error("telemetry transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;
