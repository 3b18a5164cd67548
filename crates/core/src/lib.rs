// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Build-event telemetry derivation for Buildwatch.
//!
//! This crate turns one completed CI run into the records a time-series
//! monitoring backend ingests: a numeric status metric, duration metrics,
//! and one contextual annotation per metric. The pipeline is pure and
//! infallible — every input combination produces a valid record set.
//!
//! # Quick Start
//!
//! ```no_run
//! use buildwatch_core::{derive_annotations, derive_metrics, DerivationProfile, RunSnapshot};
//! use chrono::Utc;
//!
//! # fn snapshot() -> RunSnapshot { unimplemented!() }
//! let run: RunSnapshot = snapshot();
//! let profile = DerivationProfile::default();
//! let now = Utc::now();
//!
//! let metrics = derive_metrics(&run, &profile, "ci.builds", now);
//! let annotations = derive_annotations(&run, &profile, &metrics, None);
//! ```
//!
//! # Modules
//!
//! - [`outcome`] - Outcome classification and the contextual result
//! - [`sanitize`] - Tag-value sanitization
//! - [`naming`] - Host, URL, and project-name formatting
//! - [`run`] - The read-only per-run snapshot
//! - [`tags`] - Tag-set assembly
//! - [`profile`] - Edition-dependent derivation switches
//! - [`metric`] - Metric records and the metric deriver
//! - [`annotation`] - Annotation records and the annotation deriver

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod annotation;
pub mod metric;
pub mod naming;
pub mod outcome;
pub mod profile;
pub mod run;
pub mod sanitize;
pub mod tags;

pub use annotation::{derive_annotations, AnnotationRecord};
pub use metric::{derive_metrics, system_metric, MetricRecord};
pub use outcome::Outcome;
pub use profile::{DerivationProfile, SourceMode};
pub use run::RunSnapshot;
pub use tags::TagSet;
