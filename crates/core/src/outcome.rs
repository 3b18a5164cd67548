// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Build outcome classification.
//!
//! Maps the outcome reported by the host CI system to the numeric code and
//! the human-readable strings carried on metrics and annotations. The only
//! cross-run input in the whole pipeline lives here: [`contextual_result`]
//! looks one run back to detect FIXED / STILL FAILING transitions.

use serde::{Deserialize, Deserializer, Serialize};

/// Contextual result for a run that repaired a previously failing project.
pub const FIXED: &str = "FIXED";
/// Contextual result for a run that failed after an already failing run.
pub const STILL_FAILING: &str = "STILL FAILING";
/// Result string used when the host did not report an outcome.
pub const UNKNOWN: &str = "UNKNOWN";

/// Final outcome reported by the host for one completed run.
///
/// Absence (`Option::<Outcome>::None`) means the host did not report an
/// outcome, or reported one this crate does not recognize; both resolve to
/// the [`UNKNOWN`] slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Run completed successfully.
    Success,
    /// Run completed but was marked unstable (e.g. test failures).
    Unstable,
    /// Run failed.
    Failure,
    /// Run was aborted before completion.
    Aborted,
    /// Run was skipped and never built.
    NotBuilt,
}

impl Outcome {
    /// Exact host-side name of this outcome.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::Unstable => "UNSTABLE",
            Outcome::Failure => "FAILURE",
            Outcome::Aborted => "ABORTED",
            Outcome::NotBuilt => "NOT_BUILT",
        }
    }

    /// Parse a host-side outcome name. Unrecognized names yield `None`,
    /// which downstream classification treats as [`UNKNOWN`].
    pub fn parse(name: &str) -> Option<Outcome> {
        match name {
            "SUCCESS" => Some(Outcome::Success),
            "UNSTABLE" => Some(Outcome::Unstable),
            "FAILURE" => Some(Outcome::Failure),
            "ABORTED" => Some(Outcome::Aborted),
            "NOT_BUILT" => Some(Outcome::NotBuilt),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric status code for an outcome.
///
/// Fixed table: ABORTED -1.0, NOT_BUILT -0.5, SUCCESS 0.0, absent 0.5,
/// UNSTABLE 1.0, FAILURE 2.0. Total over the enum and defined for absence,
/// so a status datapoint exists for every run.
pub fn status_number(outcome: Option<Outcome>) -> f64 {
    match outcome {
        Some(Outcome::Aborted) => -1.0,
        Some(Outcome::NotBuilt) => -0.5,
        Some(Outcome::Success) => 0.0,
        None => 0.5,
        Some(Outcome::Unstable) => 1.0,
        Some(Outcome::Failure) => 2.0,
    }
}

/// Result string for an outcome, [`UNKNOWN`] when absent.
pub fn status_name(outcome: Option<Outcome>) -> &'static str {
    match outcome {
        Some(outcome) => outcome.as_str(),
        None => UNKNOWN,
    }
}

/// Result string adjusted for the transition from the previous run.
///
/// A success directly after a failure reads [`FIXED`]; a failure directly
/// after a failure reads [`STILL_FAILING`]; every other combination passes
/// the plain result string through.
pub fn contextual_result(current: Option<Outcome>, previous: Option<Outcome>) -> &'static str {
    if previous == Some(Outcome::Failure) {
        match current {
            Some(Outcome::Success) => return FIXED,
            Some(Outcome::Failure) => return STILL_FAILING,
            _ => {}
        }
    }
    status_name(current)
}

/// Deserialize an optional outcome, mapping unrecognized host names to
/// `None` instead of failing (classification gaps are never fatal).
pub fn lenient<'de, D>(deserializer: D) -> Result<Option<Outcome>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Outcome::parse))
}
