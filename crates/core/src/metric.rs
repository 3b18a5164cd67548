// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Metric records and the per-run metric deriver.
//!
//! One completed run yields a status metric, optionally a per-result
//! presence series, and three duration metrics, all sharing a single
//! "as-of" timestamp. Derivation is pure and infallible: classification
//! gaps resolve to the unknown slot and malformed timing data is clamped,
//! never rejected.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::outcome::{status_name, status_number};
use crate::profile::DerivationProfile;
use crate::run::RunSnapshot;
use crate::sanitize::sanitize;
use crate::tags::{build_tags, host_tag, BuildExtras, TagSet};

/// Numeric build-status metric name.
pub const BUILD_STATUS: &str = "build.status";
/// Building-duration metric name.
pub const BUILD_TIME: &str = "build.time";
/// Queuing-duration metric name.
pub const QUEUE_TIME: &str = "queue.time";
/// Total-duration metric name.
pub const TOTAL_BUILD_TIME: &str = "total.build.time";

/// Display-name label for the status metric.
pub const BUILD_STATUS_LABEL: &str = "Build Status";
/// Display-name label for the building-duration metric.
pub const BUILD_TIME_LABEL: &str = "Build Time";
/// Display-name label for the queuing-duration metric.
pub const QUEUE_TIME_LABEL: &str = "Queue Time";
/// Display-name label for the total-duration metric.
pub const TOTAL_BUILD_TIME_LABEL: &str = "Total Build Time";

/// Unit string carried by the duration metrics.
pub const SECONDS: &str = "seconds";

/// One metric ready for transmission: a name, a tag set, and exactly one
/// timestamped datapoint. Field names follow the backend's camelCase wire
/// shape; the single datapoint is carried as a one-entry map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    /// Namespace grouping related metrics in the backend.
    pub scope: String,
    /// Dotted metric name.
    pub metric: String,
    /// Human-readable name shown by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Unit string, where one applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    /// Tag set for filtering and grouping.
    pub tags: TagSet,
    /// Single (epoch-seconds, value) datapoint.
    pub datapoints: BTreeMap<i64, f64>,
}

impl MetricRecord {
    /// Create a record with one datapoint and no display name or units.
    pub fn new(
        scope: impl Into<String>,
        metric: impl Into<String>,
        tags: TagSet,
        timestamp: i64,
        value: f64,
    ) -> Self {
        let mut datapoints = BTreeMap::new();
        datapoints.insert(timestamp, value);
        MetricRecord {
            scope: scope.into(),
            metric: metric.into(),
            display_name: None,
            units: None,
            tags,
            datapoints,
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Set the unit string.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Timestamp of the record's datapoint.
    pub fn timestamp(&self) -> Option<i64> {
        self.datapoints.keys().next().copied()
    }
}

/// Derive the full metric set for one completed run.
///
/// `now` is the event clock reading: it stamps every datapoint and feeds
/// the wall-clock fallback for an unreported building duration. Order:
/// status metric (plus the per-result series when the profile enables it),
/// then `build.time`, `queue.time`, `total.build.time`.
pub fn derive_metrics(
    run: &RunSnapshot,
    profile: &DerivationProfile,
    scope: &str,
    now: DateTime<Utc>,
) -> Vec<MetricRecord> {
    let timestamp = now.timestamp();
    let host = run.host_name();
    let project = run.project_name();
    let base_tags = build_tags(host.as_deref(), &project, None);
    let display = |label: &str| format!("{project}: {label}");

    let mut metrics = Vec::with_capacity(5);

    metrics.push(
        MetricRecord::new(
            scope,
            BUILD_STATUS,
            base_tags.clone(),
            timestamp,
            status_number(run.outcome),
        )
        .with_display_name(display(BUILD_STATUS_LABEL)),
    );

    if profile.result_series {
        // Presence series: the metric name is the result itself, so each
        // distinct outcome accumulates its own count. The plain result is
        // used — contextual strings would split FAILURE across two series.
        metrics.push(MetricRecord::new(
            scope,
            sanitize(status_name(run.outcome)),
            base_tags.clone(),
            timestamp,
            1.0,
        ));
    }

    let building_ms = run.building_duration_ms(now);
    let queuing_ms = run.queuing_duration_ms();
    let total_ms = run.total_duration_ms(now);

    // Commit-level identity only where it is meaningful: the total-time
    // metric carries the extended block when the run has a commit.
    let total_tags = match run.commit_id() {
        Some(commit) => build_tags(
            host.as_deref(),
            &project,
            Some(BuildExtras {
                number: run.number,
                commit,
                status: profile.status_tag.then(|| status_name(run.outcome)),
            }),
        ),
        None => base_tags.clone(),
    };

    let duration = |name: &str, label: &str, tags: TagSet, ms: i64| {
        MetricRecord::new(scope, name, tags, timestamp, ms as f64 / 1000.0)
            .with_display_name(display(label))
            .with_units(SECONDS)
    };

    metrics.push(duration(
        BUILD_TIME,
        BUILD_TIME_LABEL,
        base_tags.clone(),
        building_ms,
    ));
    metrics.push(duration(QUEUE_TIME, QUEUE_TIME_LABEL, base_tags, queuing_ms));
    metrics.push(duration(
        TOTAL_BUILD_TIME,
        TOTAL_BUILD_TIME_LABEL,
        total_tags,
        total_ms,
    ));

    metrics
}

/// One record for an injected (name, value) gauge pair, tagged with the
/// host only. How the gauge registry is populated is the caller's concern.
pub fn system_metric(
    scope: &str,
    name: &str,
    value: f64,
    host: &str,
    timestamp: i64,
) -> MetricRecord {
    MetricRecord::new(scope, name, host_tag(host), timestamp, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;
    use crate::tags::keys;
    use chrono::TimeZone;

    fn run() -> RunSnapshot {
        RunSnapshot {
            project_path: Some("folder/app".to_string()),
            number: 42,
            start_time: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            queuing_ms: 30_000,
            building_ms: Some(120_000),
            outcome: Some(Outcome::Success),
            previous_outcome: None,
            commit: Some("abc123".to_string()),
            url_path: "job/folder/job/app/42/".to_string(),
            base_url: Some("https://ci.example.com/".to_string()),
        }
    }

    fn by_name<'a>(metrics: &'a [MetricRecord], name: &str) -> &'a MetricRecord {
        metrics.iter().find(|m| m.metric == name).unwrap()
    }

    #[test]
    fn test_duration_values_in_seconds() {
        let now = Utc::now();
        let metrics = derive_metrics(&run(), &DerivationProfile::default(), "ci", now);
        assert_eq!(
            by_name(&metrics, BUILD_TIME).datapoints[&now.timestamp()],
            120.0
        );
        assert_eq!(
            by_name(&metrics, QUEUE_TIME).datapoints[&now.timestamp()],
            30.0
        );
        assert_eq!(
            by_name(&metrics, TOTAL_BUILD_TIME).datapoints[&now.timestamp()],
            150.0
        );
    }

    #[test]
    fn test_all_metrics_share_one_timestamp() {
        let now = Utc::now();
        let metrics = derive_metrics(&run(), &DerivationProfile::default(), "ci", now);
        assert_eq!(metrics.len(), 4);
        for metric in &metrics {
            assert_eq!(metric.timestamp(), Some(now.timestamp()));
            assert_eq!(metric.datapoints.len(), 1);
            assert_eq!(metric.scope, "ci");
        }
    }

    #[test]
    fn test_status_metric_value_and_tags() {
        let metrics = derive_metrics(&run(), &DerivationProfile::default(), "ci", Utc::now());
        let status = by_name(&metrics, BUILD_STATUS);
        assert_eq!(status.datapoints.values().next(), Some(&0.0));
        assert_eq!(status.tags[keys::HOST], "ci.example.com");
        assert_eq!(status.tags[keys::PROJECT], "folder.app");
        assert!(!status.tags.contains_key(keys::GIT_COMMIT));
        assert_eq!(
            status.display_name.as_deref(),
            Some("folder.app: Build Status")
        );
        assert_eq!(status.units, None);
    }

    #[test]
    fn test_absent_outcome_maps_to_unknown_slot() {
        let mut run = run();
        run.outcome = None;
        let metrics = derive_metrics(&run, &DerivationProfile::default(), "ci", Utc::now());
        let status = by_name(&metrics, BUILD_STATUS);
        assert_eq!(status.datapoints.values().next(), Some(&0.5));
    }

    #[test]
    fn test_total_time_extended_tags_with_commit() {
        let metrics = derive_metrics(&run(), &DerivationProfile::default(), "ci", Utc::now());
        let total = by_name(&metrics, TOTAL_BUILD_TIME);
        assert_eq!(total.tags[keys::BUILD_NUMBER], "42");
        assert_eq!(total.tags[keys::GIT_COMMIT], "abc123");
        assert_eq!(total.tags[keys::BUILD_STATUS], "SUCCESS");
        assert_eq!(total.units.as_deref(), Some(SECONDS));

        // The other duration metrics stay on base tags.
        assert!(!by_name(&metrics, BUILD_TIME)
            .tags
            .contains_key(keys::GIT_COMMIT));
        assert!(!by_name(&metrics, QUEUE_TIME)
            .tags
            .contains_key(keys::BUILD_NUMBER));
    }

    #[test]
    fn test_total_time_base_tags_without_commit() {
        let mut run = run();
        run.commit = Some(String::new());
        let metrics = derive_metrics(&run, &DerivationProfile::default(), "ci", Utc::now());
        let total = by_name(&metrics, TOTAL_BUILD_TIME);
        assert!(!total.tags.contains_key(keys::GIT_COMMIT));
        assert!(!total.tags.contains_key(keys::BUILD_NUMBER));
        assert!(!total.tags.contains_key(keys::BUILD_STATUS));
    }

    #[test]
    fn test_status_tag_disabled_by_profile() {
        let profile = DerivationProfile {
            status_tag: false,
            ..DerivationProfile::default()
        };
        let metrics = derive_metrics(&run(), &profile, "ci", Utc::now());
        let total = by_name(&metrics, TOTAL_BUILD_TIME);
        assert!(total.tags.contains_key(keys::GIT_COMMIT));
        assert!(!total.tags.contains_key(keys::BUILD_STATUS));
    }

    #[test]
    fn test_result_series_enabled() {
        let profile = DerivationProfile {
            result_series: true,
            ..DerivationProfile::default()
        };
        let mut run = run();
        run.outcome = Some(Outcome::NotBuilt);
        let metrics = derive_metrics(&run, &profile, "ci", Utc::now());
        assert_eq!(metrics.len(), 5);
        let series = by_name(&metrics, "NOT-BUILT");
        assert_eq!(series.datapoints.values().next(), Some(&1.0));
        assert_eq!(series.display_name, None);
        assert_eq!(series.units, None);
    }

    #[test]
    fn test_missing_base_url_narrows_tags() {
        let mut run = run();
        run.base_url = None;
        let metrics = derive_metrics(&run, &DerivationProfile::default(), "ci", Utc::now());
        for metric in &metrics {
            assert!(!metric.tags.contains_key(keys::HOST));
            assert!(metric.tags.contains_key(keys::PROJECT));
        }
    }

    #[test]
    fn test_in_progress_fallback_building_duration() {
        let mut run = run();
        run.building_ms = None;
        let now = run.start_time + chrono::Duration::milliseconds(90_000);
        let metrics = derive_metrics(&run, &DerivationProfile::default(), "ci", now);
        assert_eq!(by_name(&metrics, BUILD_TIME).datapoints[&now.timestamp()], 90.0);
        assert_eq!(
            by_name(&metrics, TOTAL_BUILD_TIME).datapoints[&now.timestamp()],
            120.0
        );
    }

    #[test]
    fn test_system_metric_host_tag_only() {
        let metric = system_metric("ci", "vm.memory.heap.usage", 0.42, "ci.example.com", 1_700_000_000);
        assert_eq!(metric.metric, "vm.memory.heap.usage");
        assert_eq!(metric.tags.len(), 1);
        assert_eq!(metric.tags[keys::HOST], "ci.example.com");
        assert_eq!(metric.datapoints[&1_700_000_000], 0.42);
        assert_eq!(metric.display_name, None);
        assert_eq!(metric.units, None);
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let metric = MetricRecord::new("ci", BUILD_STATUS, TagSet::new(), 1_700_000_000, 0.0)
            .with_display_name("app: Build Status");
        let json = serde_json::to_value(&metric).unwrap();
        assert!(json.get("displayName").is_some());
        assert!(json.get("display_name").is_none());
        // Units are omitted entirely when unset.
        assert!(json.get("units").is_none());
        assert_eq!(json["datapoints"]["1700000000"], 0.0);
    }
}
