//! # feedvault: feed-to-vector-store ingestion
//!
//! Thin entrypoint; all logic lives in the `feedvault_cli` library crate.

use anyhow::Result;
use clap::Parser;
use feedvault::AppConfig;
use feedvault_cli::{run, Cli};
use tracing_subscriber::{fmt, EnvFilter};

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Setup logging
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive("feedvault=info".parse()?))
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 2. Parse CLI arguments, then load configuration
    let cli = Cli::parse();
    let result = match AppConfig::from_env() {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    // 3. Report the final result
    if let Err(e) = result {
        eprintln!("[feedvault error] {e:#}");
        std::process::exit(1);
    }

    Ok(())
}
