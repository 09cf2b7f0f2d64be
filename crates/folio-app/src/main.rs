// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio — command-line document transcription
//
// Entry point. Initialises logging and backend services, then runs the
// requested command.

mod cli;
mod services;

use std::process::ExitCode;

use clap::Parser;
use folio_core::human_errors::humanize_error;

use cli::Cli;
use services::app_services::AppServices;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("Folio starting");

    let outcome = match AppServices::init() {
        Ok(services) => cli::run(cli, services).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(outcome) => {
            println!("{}", outcome.stdout);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::debug!(error = %e, "Command failed");
            let human = humanize_error(&e);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}
