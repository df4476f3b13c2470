//! Trellis CLI binary.

use std::process::ExitCode;
use trellis::cli::{Cli, exit_code};
use tracing_subscriber::EnvFilter;

/// Main entry point for the trellis CLI.
///
/// Uses tokio's current_thread runtime; every command is a short sequence of
/// file IO.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Controlled via RUST_LOG, e.g. RUST_LOG=trellis=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trellis=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting trellis CLI");

    let cli = Cli::parse_args();
    match cli.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
