// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI for Buildwatch.
//!
//! This crate provides the command-line interface for Buildwatch: deriving
//! and pushing telemetry for a completed run, previewing records without a
//! network, testing the backend connection, sending custom metrics, and
//! one-shot system-metrics sweeps.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use buildwatch_client::HttpTelemetryClient;
use buildwatch_core::{derive_annotations, derive_metrics, naming, RunSnapshot};
use buildwatch_notifier::system::sweep_metrics;
use buildwatch_notifier::{custom_metric_record, CustomMetric, NotifierConfig};
use chrono::Utc;
use clap::{Parser, Subcommand};

/// Buildwatch CLI.
#[derive(Parser, Debug)]
#[command(name = "buildwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file. Environment variables with the
    /// BUILDWATCH__ prefix layer on top.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive telemetry for a completed run and push it to the backend.
    Send {
        /// Path to a run-event JSON file.
        run: PathBuf,
    },

    /// Derive telemetry for a completed run and print it as JSON.
    Preview {
        /// Path to a run-event JSON file.
        run: PathBuf,
    },

    /// Test the backend connection with a login/logout round trip.
    Check,

    /// Push one custom metric for a run.
    Metric {
        /// Path to a run-event JSON file.
        run: PathBuf,

        /// Dotted metric name.
        #[arg(short, long)]
        name: String,

        /// Datapoint value.
        #[arg(short, long)]
        value: f64,

        /// Tag as key=value; repeatable.
        #[arg(short, long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,

        /// Scope override (defaults to the configured scope).
        #[arg(long)]
        scope: Option<String>,

        /// Display name shown by the backend.
        #[arg(long)]
        display_name: Option<String>,
    },

    /// Push one sweep of system metrics from a JSON name-to-value map.
    Sweep {
        /// Path to a JSON object mapping gauge names to numeric values.
        gauges: PathBuf,
    },
}

/// Parse a `key=value` tag argument.
fn parse_tag(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

fn read_run(path: &Path) -> Result<RunSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading run event {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing run event {}", path.display()))
}

fn require_configured(config: &NotifierConfig) -> Result<()> {
    if !config.is_configured() {
        bail!("notifier is not configured: endpoint, scope, username, and password are required");
    }
    Ok(())
}

fn client_for(config: &NotifierConfig) -> HttpTelemetryClient {
    HttpTelemetryClient::new(&config.endpoint, &config.username, &config.password)
}

/// Run the CLI with the given arguments.
pub async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = NotifierConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Send { run } => {
            require_configured(&config)?;
            let snapshot = read_run(&run)?;
            let now = Utc::now();
            let metrics = derive_metrics(&snapshot, &config.profile, &config.scope, now);
            let annotations = derive_annotations(
                &snapshot,
                &config.profile,
                &metrics,
                config.source_override(),
            );
            client_for(&config).deliver(&metrics, &annotations).await?;
            println!(
                "Sent {} metrics and {} annotations",
                metrics.len(),
                annotations.len()
            );
            Ok(())
        }

        Commands::Preview { run } => {
            let snapshot = read_run(&run)?;
            let now = Utc::now();
            let metrics = derive_metrics(&snapshot, &config.profile, &config.scope, now);
            let annotations = derive_annotations(
                &snapshot,
                &config.profile,
                &metrics,
                config.source_override(),
            );
            let preview = serde_json::json!({
                "metrics": metrics,
                "annotations": annotations,
            });
            println!("{}", serde_json::to_string_pretty(&preview)?);
            Ok(())
        }

        Commands::Check => {
            require_configured(&config)?;
            client_for(&config).check_connection().await?;
            println!("Connection to {} OK", config.endpoint);
            Ok(())
        }

        Commands::Metric {
            run,
            name,
            value,
            tags,
            scope,
            display_name,
        } => {
            require_configured(&config)?;
            let snapshot = read_run(&run)?;
            let metric = CustomMetric {
                name,
                value,
                tags: tags.into_iter().collect(),
                scope,
                display_name,
            };
            let record = custom_metric_record(&snapshot, &metric, &config.scope, Utc::now());
            client_for(&config)
                .deliver(std::slice::from_ref(&record), &[])
                .await?;
            println!("Sent metric '{}' with value {}", record.metric, value);
            Ok(())
        }

        Commands::Sweep { gauges } => {
            require_configured(&config)?;
            let raw = std::fs::read_to_string(&gauges)
                .with_context(|| format!("reading gauge map {}", gauges.display()))?;
            let samples: BTreeMap<String, f64> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing gauge map {}", gauges.display()))?;
            let Some(host) = naming::host_name(config.base_url.as_deref()) else {
                bail!("base_url is required to derive the host tag for system metrics");
            };
            let samples: Vec<(String, f64)> = samples.into_iter().collect();
            let metrics = sweep_metrics(&samples, &config.scope, &host, Utc::now());
            if metrics.is_empty() {
                println!("No finite gauge values to send");
                return Ok(());
            }
            client_for(&config).deliver(&metrics, &[]).await?;
            println!("Sent {} system metrics", metrics.len());
            Ok(())
        }
    }
}
