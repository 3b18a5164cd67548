// Copyright 2025 Buildwatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Buildwatch CLI entry point.

#[tokio::main]
async fn main() {
    if let Err(e) = buildwatch_cli::run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
