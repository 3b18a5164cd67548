// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Derivation profile.
//!
//! The record format evolved over several editions (extra tags, a
//! per-result presence series, two conventions for the annotation source).
//! Instead of parallel builder variants, one profile struct selects the
//! edition-dependent behavior; configuration supplies it per process.

use serde::{Deserialize, Serialize};

/// How the annotation `source` field is derived when no explicit override
/// is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Bare host name of the CI system (newer convention, default).
    #[default]
    HostName,
    /// Full base URL of the CI system (older convention).
    BaseUrl,
}

/// Edition-dependent switches for the derivation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationProfile {
    /// Include `build_status` whenever the extended tag block is added.
    pub status_tag: bool,
    /// Emit the per-result presence series (metric named after the
    /// sanitized result string, constant value 1.0) next to `build.status`.
    pub result_series: bool,
    /// Annotation source derivation when no override is configured.
    pub source_mode: SourceMode,
}

impl Default for DerivationProfile {
    fn default() -> Self {
        DerivationProfile {
            status_tag: true,
            result_series: false,
            source_mode: SourceMode::HostName,
        }
    }
}
