// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio: image and PDF document store.
//
// Entry point. Resolves the data directory and config, initialises logging,
// opens the document service and runs one command. Results go to stdout as
// JSON; failures go to stderr as an error report.

mod cli;
mod commands;
mod data_dir;

use std::process::ExitCode;

use clap::Parser;
use folio_service::DocumentService;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use commands::{CliError, Outcome};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(outcome) => {
            print_json(&outcome.body);
            if outcome.clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            match serde_json::to_string_pretty(&err.report()) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{err}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<Outcome, CliError> {
    let resolved = data_dir::resolve(cli.data_dir, cli.config)?;
    init_logging(&resolved.config.log_level);
    tracing::debug!(data_dir = %resolved.data_dir.display(), "data directory resolved");

    let service = DocumentService::open(&resolved.data_dir, resolved.config)?;
    commands::run(&service, cli.cmd)
}

/// `RUST_LOG` wins; otherwise the configured level. Logs go to stderr so
/// stdout stays pure JSON.
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("{value}"),
    }
}
