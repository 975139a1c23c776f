//! Binary crate for the `weather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Loading `.env` and resolving configuration
//! - Human-friendly output formatting

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use weather_core::config::{self, DOTENV_FILE};

mod cli;
mod display;

fn main() -> ExitCode {
    let cmd = cli::Cli::parse();

    // SAFETY: no other threads exist yet; the runtime is built below.
    let dotenv = unsafe { config::load_dotenv(DOTENV_FILE) };
    init_tracing();

    if let Err(err) = dotenv {
        eprintln!("Warning: {err}");
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(cmd.run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`), which `.env` may set.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
