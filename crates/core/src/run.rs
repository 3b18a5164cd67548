// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Read-only view of one completed run.
//!
//! A [`RunSnapshot`] is assembled by the host integration (or parsed from a
//! JSON event) once per completion and passed through the derivation
//! pipeline unchanged. The only cross-run input it carries is the outcome of
//! the immediately preceding run on the same project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::naming;
use crate::outcome::{self, Outcome};

/// Read-only data for a single completed run.
///
/// Reported durations may be negative or missing when the host's timing
/// source misbehaves; the accessors below clamp and reconcile so that
/// derivation never fails on malformed timing data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// Full project path, segments joined by `/`. Absent renders as "null".
    #[serde(default)]
    pub project_path: Option<String>,
    /// Build number, positive.
    pub number: u32,
    /// Start time of the run.
    pub start_time: DateTime<Utc>,
    /// Time spent queued before the run started, in milliseconds.
    #[serde(default)]
    pub queuing_ms: i64,
    /// Time spent building, in milliseconds. `None` means the host still
    /// registered the run as in progress at measurement time and the
    /// deriver falls back to wall-clock time since start.
    #[serde(default)]
    pub building_ms: Option<i64>,
    /// Final outcome; unrecognized host strings deserialize to `None`.
    #[serde(default, deserialize_with = "outcome::lenient")]
    pub outcome: Option<Outcome>,
    /// Outcome of the immediately preceding run on the same project.
    #[serde(default, deserialize_with = "outcome::lenient")]
    pub previous_outcome: Option<Outcome>,
    /// Commit identifier, when the host exposes one. Blank means absent.
    #[serde(default)]
    pub commit: Option<String>,
    /// URL of the run relative to the system base URL.
    pub url_path: String,
    /// Base URL of the enclosing system.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl RunSnapshot {
    /// Queuing duration in milliseconds, clamped to zero.
    pub fn queuing_duration_ms(&self) -> i64 {
        self.queuing_ms.max(0)
    }

    /// Building duration in milliseconds, clamped to zero. When the host
    /// did not report one, falls back to wall-clock time since the run
    /// started, measured against `now`.
    pub fn building_duration_ms(&self, now: DateTime<Utc>) -> i64 {
        match self.building_ms {
            Some(ms) => ms.max(0),
            None => now
                .signed_duration_since(self.start_time)
                .num_milliseconds()
                .max(0),
        }
    }

    /// Total duration in milliseconds: queuing + building after clamping,
    /// so total >= building holds by construction.
    pub fn total_duration_ms(&self, now: DateTime<Utc>) -> i64 {
        self.queuing_duration_ms() + self.building_duration_ms(now)
    }

    /// Commit identifier, with blank treated as absent.
    pub fn commit_id(&self) -> Option<&str> {
        self.commit
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Dotted project name.
    pub fn project_name(&self) -> String {
        naming::project_name(self.project_path.as_deref())
    }

    /// Bare host name of the enclosing system, when the base URL is known.
    pub fn host_name(&self) -> Option<String> {
        naming::host_name(self.base_url.as_deref())
    }

    /// Fully qualified URL of the run, degrading to the relative path when
    /// the base URL is unknown.
    pub fn resource_url(&self) -> String {
        naming::resource_url(self.base_url.as_deref(), &self.url_path)
    }

    /// Contextual result string (FIXED / STILL FAILING / plain).
    pub fn contextual_result(&self) -> &'static str {
        outcome::contextual_result(self.outcome, self.previous_outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot() -> RunSnapshot {
        RunSnapshot {
            project_path: Some("folder/app".to_string()),
            number: 42,
            start_time: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            queuing_ms: 30_000,
            building_ms: Some(120_000),
            outcome: Some(Outcome::Success),
            previous_outcome: Some(Outcome::Failure),
            commit: Some("abc123".to_string()),
            url_path: "job/folder/job/app/42/".to_string(),
            base_url: Some("https://ci.example.com/".to_string()),
        }
    }

    #[test]
    fn test_durations_reconcile() {
        let run = snapshot();
        let now = Utc::now();
        assert_eq!(run.queuing_duration_ms(), 30_000);
        assert_eq!(run.building_duration_ms(now), 120_000);
        assert_eq!(run.total_duration_ms(now), 150_000);
    }

    #[test]
    fn test_negative_durations_clamped() {
        let mut run = snapshot();
        run.queuing_ms = -5;
        run.building_ms = Some(-1);
        let now = Utc::now();
        assert_eq!(run.queuing_duration_ms(), 0);
        assert_eq!(run.building_duration_ms(now), 0);
        assert_eq!(run.total_duration_ms(now), 0);
    }

    #[test]
    fn test_missing_building_duration_falls_back_to_wall_clock() {
        let mut run = snapshot();
        run.building_ms = None;
        let now = run.start_time + chrono::Duration::milliseconds(45_000);
        assert_eq!(run.building_duration_ms(now), 45_000);
        assert_eq!(run.total_duration_ms(now), 75_000);

        // Clock behind the start time clamps to zero rather than going
        // negative.
        assert_eq!(run.building_duration_ms(run.start_time - chrono::Duration::seconds(1)), 0);
    }

    #[test]
    fn test_blank_commit_is_absent() {
        let mut run = snapshot();
        assert_eq!(run.commit_id(), Some("abc123"));
        run.commit = Some("   ".to_string());
        assert_eq!(run.commit_id(), None);
        run.commit = None;
        assert_eq!(run.commit_id(), None);
    }

    #[test]
    fn test_derived_names() {
        let run = snapshot();
        assert_eq!(run.project_name(), "folder.app");
        assert_eq!(run.host_name(), Some("ci.example.com".to_string()));
        assert_eq!(
            run.resource_url(),
            "https://ci.example.com/job/folder/job/app/42/"
        );
        assert_eq!(run.contextual_result(), "FIXED");
    }

    #[test]
    fn test_event_json_with_unknown_outcome() {
        let json = r#"{
            "project_path": "app",
            "number": 7,
            "start_time": "2025-06-01T12:00:00Z",
            "outcome": "REGRESSION",
            "url_path": "job/app/7/"
        }"#;
        let run: RunSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(run.outcome, None);
        assert_eq!(run.previous_outcome, None);
        assert_eq!(run.queuing_ms, 0);
        assert_eq!(run.building_ms, None);
    }
}
