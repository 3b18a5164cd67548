// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Build-event orchestration.
//!
//! The dispatcher sequences one completed run through the derivation
//! pipeline and hands the records to the sink: derive metrics, derive
//! annotations, deliver both lists in one session (annotations skipped when
//! the batch is empty).
//! Sink failures are logged with severity matching their cause and
//! swallowed — one failed push never blocks subsequent build events, and no
//! retry is attempted here.

use std::collections::BTreeMap;

use buildwatch_client::{SinkError, TelemetrySink};
use buildwatch_core::metric::MetricRecord;
use buildwatch_core::sanitize::sanitize;
use buildwatch_core::tags::{build_tags, TagSet};
use buildwatch_core::{derive_annotations, derive_metrics, RunSnapshot};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::NotifierConfig;

/// A user-defined metric attached to a run, e.g. from a pipeline step.
#[derive(Debug, Clone)]
pub struct CustomMetric {
    /// Dotted metric name.
    pub name: String,
    /// Datapoint value.
    pub value: f64,
    /// User-supplied tags; values are sanitized, and the standard build
    /// tags win on key conflict.
    pub tags: BTreeMap<String, String>,
    /// Scope override; the configured scope applies when absent.
    pub scope: Option<String>,
    /// Display name, when one applies.
    pub display_name: Option<String>,
}

/// Build the record for a custom metric. The run's standard identity tags
/// (host, project) are merged over the user's tags so a record can never
/// misattribute itself to another project.
pub fn custom_metric_record(
    run: &RunSnapshot,
    metric: &CustomMetric,
    default_scope: &str,
    now: DateTime<Utc>,
) -> MetricRecord {
    let scope = metric.scope.as_deref().unwrap_or(default_scope);
    let mut tags: TagSet = metric
        .tags
        .iter()
        .map(|(key, value)| (key.clone(), sanitize(value)))
        .collect();
    tags.extend(build_tags(
        run.host_name().as_deref(),
        &run.project_name(),
        None,
    ));

    let mut record = MetricRecord::new(scope, &metric.name, tags, now.timestamp(), metric.value);
    if let Some(display_name) = &metric.display_name {
        record = record.with_display_name(display_name);
    }
    record
}

/// Sequences derivation and delivery for completed runs.
pub struct Dispatcher<S> {
    config: NotifierConfig,
    sink: S,
}

impl<S: TelemetrySink> Dispatcher<S> {
    /// Create a dispatcher over a configuration snapshot and a sink.
    pub fn new(config: NotifierConfig, sink: S) -> Self {
        Dispatcher { config, sink }
    }

    /// The configuration this dispatcher was created with.
    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Callback for one completed run. Forwards only when the notifier is
    /// configured and sending for all builds is enabled.
    pub async fn run_completed(&self, run: &RunSnapshot, now: DateTime<Utc>) {
        if !self.config.is_configured() {
            debug!("notifier not configured, skipping completed run");
            return;
        }
        if !self.config.send_all_builds {
            debug!("send_all_builds disabled, skipping completed run");
            return;
        }
        self.send_run(run, now).await;
    }

    /// Derive and push telemetry for one run unconditionally (the explicit
    /// send path; still requires configuration, checked by the caller).
    pub async fn send_run(&self, run: &RunSnapshot, now: DateTime<Utc>) {
        let metrics = derive_metrics(run, &self.config.profile, &self.config.scope, now);
        let annotations = derive_annotations(
            run,
            &self.config.profile,
            &metrics,
            self.config.source_override(),
        );

        info!(
            project = %run.project_name(),
            number = run.number,
            metrics = metrics.len(),
            annotations = annotations.len(),
            "sending build telemetry"
        );

        if let Err(err) = self.sink.deliver(&metrics, &annotations).await {
            log_sink_error(&err);
        }
    }

    /// Push one custom metric for a run. No annotations accompany it.
    pub async fn send_custom_metric(
        &self,
        run: &RunSnapshot,
        metric: &CustomMetric,
        now: DateTime<Utc>,
    ) {
        if !self.config.is_configured() {
            debug!("notifier not configured, skipping custom metric");
            return;
        }
        let record = custom_metric_record(run, metric, &self.config.scope, now);
        info!(
            metric = %record.metric,
            timestamp = now.timestamp(),
            value = metric.value,
            "sending custom metric"
        );
        if let Err(err) = self.sink.push_metrics(std::slice::from_ref(&record)).await {
            log_sink_error(&err);
        }
    }
}

/// Log a sink failure with severity matching its cause.
pub(crate) fn log_sink_error(err: &SinkError) {
    match err {
        SinkError::TokenExpired => {
            warn!(error = %err, "telemetry credentials rejected");
        }
        SinkError::UnknownHost(_) => {
            error!(error = %err, "telemetry host unreachable");
        }
        _ => {
            error!(error = %err, "failed to send telemetry");
        }
    }
}
