// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Periodic system-metrics sweep.
//!
//! A [`GaugeSource`] supplies (name, value) samples — how the underlying
//! registry is populated is not this module's concern. Each finite sample
//! maps to one host-tagged metric record; the task pushes a sweep on a
//! fixed interval when system metrics are enabled.

use std::collections::BTreeMap;

use buildwatch_client::TelemetrySink;
use buildwatch_core::metric::MetricRecord;
use buildwatch_core::{naming, system_metric};
use chrono::{DateTime, Utc};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::NotifierConfig;
use crate::dispatcher::log_sink_error;

/// Supplies point-in-time gauge samples for the system sweep.
pub trait GaugeSource: Send + Sync {
    /// Current (name, value) samples.
    fn samples(&self) -> Vec<(String, f64)>;
}

/// A plain name-to-value map is a valid source, e.g. one parsed from JSON.
impl GaugeSource for BTreeMap<String, f64> {
    fn samples(&self) -> Vec<(String, f64)> {
        self.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}

/// Map gauge samples to host-tagged metric records. Non-finite values are
/// skipped; the backend has no representation for them.
pub fn sweep_metrics(
    samples: &[(String, f64)],
    scope: &str,
    host: &str,
    now: DateTime<Utc>,
) -> Vec<MetricRecord> {
    let timestamp = now.timestamp();
    samples
        .iter()
        .filter_map(|(name, value)| {
            if value.is_finite() {
                Some(system_metric(scope, name, *value, host, timestamp))
            } else {
                debug!(gauge = %name, value = *value, "skipping non-finite gauge");
                None
            }
        })
        .collect()
}

/// Periodically pushes one sweep of system metrics to the sink.
pub struct SystemMetricsTask<S> {
    config: NotifierConfig,
    sink: S,
    source: Box<dyn GaugeSource>,
}

impl<S: TelemetrySink> SystemMetricsTask<S> {
    /// Create a sweep task over a configuration snapshot, a sink, and a
    /// gauge source.
    pub fn new(config: NotifierConfig, sink: S, source: Box<dyn GaugeSource>) -> Self {
        SystemMetricsTask {
            config,
            sink,
            source,
        }
    }

    /// Perform one sweep: sample, map, push. An empty sweep is not pushed.
    pub async fn sweep_once(&self, now: DateTime<Utc>) {
        let Some(host) = naming::host_name(self.config.base_url.as_deref()) else {
            warn!("no base URL configured, cannot derive host for system metrics");
            return;
        };
        let metrics = sweep_metrics(&self.source.samples(), &self.config.scope, &host, now);
        if metrics.is_empty() {
            debug!("system-metrics sweep produced no records");
            return;
        }
        info!(metrics = metrics.len(), "sending system metrics");
        if let Err(err) = self.sink.push_metrics(&metrics).await {
            log_sink_error(&err);
        }
    }

    /// Run sweeps until the surrounding runtime shuts the task down.
    /// Returns immediately when system metrics are disabled or the
    /// notifier is not configured.
    pub async fn run(self) {
        if !self.config.send_system_metrics || !self.config.is_configured() {
            debug!("system metrics disabled, sweep task exiting");
            return;
        }
        let period = Duration::from_secs(self.config.system_metrics_interval_secs.max(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.sweep_once(Utc::now()).await;
        }
    }
}
