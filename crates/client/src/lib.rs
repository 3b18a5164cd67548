// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Telemetry sink for Buildwatch.
//!
//! This crate holds the [`TelemetrySink`] seam the orchestrator pushes
//! derived records through, the [`SinkError`] taxonomy that drives log
//! severity, and the HTTP implementation talking to the backend.
//!
//! # Modules
//!
//! - [`sink`] - The object-safe sink trait
//! - [`http`] - HTTP client (login / put metrics / put annotations / logout)
//! - [`error`] - Error taxonomy

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod http;
pub mod sink;

pub use error::{Result, SinkError};
pub use http::HttpTelemetryClient;
pub use sink::TelemetrySink;
