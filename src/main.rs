//! Generate `token.json` for Google API clients.
//!
//! Reads `credentials.json` from the working directory, runs the browser
//! consent flow and saves the token next to it.
//!
//! Run with: cargo run --bin regenerate-google-token

use std::process::ExitCode;

use anyhow::Context;
use google_token_bootstrap::SystemBrowser;
use google_token_bootstrap::bootstrap::{self, BootstrapConfig, Outcome};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(Outcome::Saved { .. }) => ExitCode::SUCCESS,
        Ok(Outcome::MissingCredentials) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<Outcome> {
    let config = BootstrapConfig::default();
    let mut stdout = std::io::stdout().lock();
    bootstrap::run(&config, &SystemBrowser, &mut stdout).context("token generation failed")
}
