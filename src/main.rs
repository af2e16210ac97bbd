// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! EvalHub - AI model management for evaluation workflows
//!
//! Entry point for the EvalHub CLI application.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use evalhub::cli::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(error) = cli::run(cli).await {
        eprintln!("error: {}", error);
        std::process::exit(1);
    }
}

/// RUST_LOG wins when set; otherwise -v flags pick the level
fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("evalhub={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
