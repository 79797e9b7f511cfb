// SPDX-FileCopyrightText: 2026 Sluice Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sluice - reliable job dispatch to backends behind an unstable tunnel.
//!
//! This is the binary entry point for the sluice CLI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod doctor;
mod replay;
mod runtime;
mod status;
mod submit;

/// Sluice - reliable job dispatch to backends behind an unstable tunnel.
#[derive(Parser, Debug)]
#[command(name = "sluice", version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Dispatch a batch of jobs from a JSON file.
    Submit {
        /// Path to a JSON array of jobs: [{"id": "...", "payload": {...}}, ...]
        file: PathBuf,
    },
    /// Redeliver jobs from the durable queue.
    Replay {
        /// Wait for the tunnel gateway to answer before replaying.
        #[arg(long)]
        wait: bool,
    },
    /// Show the durable queue state without touching the network.
    Status,
    /// Run diagnostic checks against the configured environment.
    Doctor {
        /// Also verify endpoint credentials by performing a real login.
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match sluice_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            sluice_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    let result = match cli.command {
        Commands::Submit { file } => submit::run_submit(&config, &file).await,
        Commands::Replay { wait } => replay::run_replay(&config, wait).await,
        Commands::Status => status::run_status(&config),
        Commands::Doctor { deep, plain } => doctor::run_doctor(&config, deep, plain).await,
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("sluice: {e}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sluice={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
