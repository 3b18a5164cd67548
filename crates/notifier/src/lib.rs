// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Build-event orchestration for Buildwatch.
//!
//! Ties the pure derivation pipeline in `buildwatch-core` to a
//! `buildwatch-client` sink: per-process configuration with gating, the
//! run-completed dispatcher, and the periodic system-metrics sweep.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading and gating
//! - [`dispatcher`] - Run-completed orchestration and custom metrics
//! - [`system`] - Gauge source seam and the periodic sweep task

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod dispatcher;
pub mod system;

pub use config::{ConfigError, NotifierConfig};
pub use dispatcher::{custom_metric_record, CustomMetric, Dispatcher};
pub use system::{GaugeSource, SystemMetricsTask};
