// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Notifier configuration.
//!
//! One read-only struct supplied per process: backend endpoint and
//! credentials, scope, source override, the system's base URL, the feature
//! toggles, and the derivation profile. Loaded by layering an optional TOML
//! file and `BUILDWATCH__`-prefixed environment variables over serde
//! defaults.

use std::path::Path;

use buildwatch_core::DerivationProfile;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default seconds between system-metrics sweeps.
const DEFAULT_SYSTEM_METRICS_INTERVAL_SECS: u64 = 60;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file or environment layer could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Read-only notifier configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Telemetry backend endpoint, e.g. `https://argus.example.com/ws`.
    pub endpoint: String,
    /// Backend username.
    pub username: String,
    /// Backend password.
    pub password: String,
    /// Scope grouping this system's metrics in the backend.
    pub scope: String,
    /// Explicit annotation source; blank means derive from the base URL.
    pub source: String,
    /// Base URL of the CI system the runs come from.
    pub base_url: Option<String>,
    /// Forward telemetry for every completed build.
    pub send_all_builds: bool,
    /// Run the periodic system-metrics sweep.
    pub send_system_metrics: bool,
    /// Seconds between system-metrics sweeps.
    pub system_metrics_interval_secs: u64,
    /// Edition-dependent derivation switches.
    pub profile: DerivationProfile,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        NotifierConfig {
            endpoint: String::new(),
            username: String::new(),
            password: String::new(),
            scope: String::new(),
            source: String::new(),
            base_url: None,
            send_all_builds: true,
            send_system_metrics: false,
            system_metrics_interval_secs: DEFAULT_SYSTEM_METRICS_INTERVAL_SECS,
            profile: DerivationProfile::default(),
        }
    }
}

// Credentials must never leak into logs.
impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("scope", &self.scope)
            .field("source", &self.source)
            .field("base_url", &self.base_url)
            .field("send_all_builds", &self.send_all_builds)
            .field("send_system_metrics", &self.send_system_metrics)
            .field(
                "system_metrics_interval_secs",
                &self.system_metrics_interval_secs,
            )
            .field("profile", &self.profile)
            .finish()
    }
}

impl NotifierConfig {
    /// Whether the notifier has everything it needs to send telemetry:
    /// endpoint, scope, and both credential halves non-blank.
    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty()
            && !self.scope.trim().is_empty()
            && !self.username.trim().is_empty()
            && !self.password.trim().is_empty()
    }

    /// The explicit annotation source, when one is configured non-blank.
    pub fn source_override(&self) -> Option<&str> {
        let source = self.source.trim();
        (!source.is_empty()).then_some(source)
    }

    /// Load configuration: serde defaults, then an optional TOML file, then
    /// `BUILDWATCH__`-prefixed environment variables (nested keys separated
    /// by `__`, e.g. `BUILDWATCH__PROFILE__RESULT_SERIES`).
    pub fn load(path: Option<&Path>) -> Result<NotifierConfig, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("BUILDWATCH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
