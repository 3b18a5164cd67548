// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Annotation records and the per-run annotation deriver.
//!
//! Every metric derived for a run gets one annotation correlating it to the
//! run's contextual status, number, and URL. Annotations share their source
//! metric's timestamp, scope, and tag set and carry a fresh UUID each so a
//! batch never collides with itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metric::MetricRecord;
use crate::profile::{DerivationProfile, SourceMode};
use crate::run::RunSnapshot;
use crate::tags::TagSet;

/// Annotation type carried by every build annotation.
pub const BUILD_ANNOTATION_TYPE: &str = "BUILD";

/// Field key for the contextual result string.
pub const BUILD_STATUS_FIELD: &str = "Build Status";
/// Field key for the build number.
pub const BUILD_NUMBER_FIELD: &str = "Build Number";
/// Field key for the run URL.
pub const URL_FIELD: &str = "URL";

/// One annotation ready for transmission, correlated to a single metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    /// Namespace, same as the annotated metric.
    pub scope: String,
    /// Epoch-seconds timestamp, same as the annotated metric's datapoint.
    pub timestamp: i64,
    /// Unique id, fresh per annotation.
    pub id: String,
    /// Originating system: explicit override, base URL, or bare host name.
    pub source: String,
    /// Fixed annotation type.
    #[serde(rename = "type")]
    pub annotation_type: String,
    /// Name of the annotated metric.
    pub metric: String,
    /// Tag set, same as the annotated metric.
    pub tags: TagSet,
    /// Human-readable context fields.
    pub fields: BTreeMap<String, String>,
}

/// Resolve the annotation source for a run: a non-blank explicit override
/// wins; otherwise the profile's source mode picks the base URL or the bare
/// host name. When nothing is derivable the source is empty.
pub fn resolve_source(
    run: &RunSnapshot,
    profile: &DerivationProfile,
    source_override: Option<&str>,
) -> String {
    if let Some(source) = source_override {
        if !source.trim().is_empty() {
            return source.to_string();
        }
    }
    match profile.source_mode {
        SourceMode::BaseUrl => run.base_url.clone(),
        SourceMode::HostName => run.host_name(),
    }
    .unwrap_or_default()
}

/// Derive one annotation per metric for a completed run.
pub fn derive_annotations(
    run: &RunSnapshot,
    profile: &DerivationProfile,
    metrics: &[MetricRecord],
    source_override: Option<&str>,
) -> Vec<AnnotationRecord> {
    let source = resolve_source(run, profile, source_override);

    let mut fields = BTreeMap::new();
    fields.insert(
        BUILD_STATUS_FIELD.to_string(),
        run.contextual_result().to_string(),
    );
    fields.insert(BUILD_NUMBER_FIELD.to_string(), run.number.to_string());
    fields.insert(URL_FIELD.to_string(), run.resource_url());

    metrics
        .iter()
        .map(|metric| AnnotationRecord {
            scope: metric.scope.clone(),
            timestamp: metric.timestamp().unwrap_or_default(),
            id: Uuid::new_v4().to_string(),
            source: source.clone(),
            annotation_type: BUILD_ANNOTATION_TYPE.to_string(),
            metric: metric.metric.clone(),
            tags: metric.tags.clone(),
            fields: fields.clone(),
        })
        .collect()
}
