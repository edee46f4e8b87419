//! `git-lfs-locks` entry point.
//!
//! This binary is the composition root for the workspace. Responsibilities:
//!
//! 1. **Parse configuration**: flags and environment variables (see
//!    [`config::Cli`]).
//! 2. **Wire observability**: install a `tracing-subscriber` stack with an
//!    optional OpenTelemetry OTLP exporter ([`telemetry`]).
//! 3. **Construct infrastructure**: an HTTP-backed [`lfs_api::Client`] for
//!    protocol commands, `git config` access for setup commands.
//! 4. **Dispatch**: run exactly one subcommand ([`commands::run`]).

mod commands;
mod config;
mod telemetry;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use crate::config::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = match telemetry::init(cli.global.log_format) {
        Ok(telemetry) => telemetry,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = commands::run(cli).await;
    let code = match result {
        Ok(code) => code,
        Err(err) => {
            error!(error = %format!("{err:#}"), "Command failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    };

    telemetry.shutdown();
    code
}
