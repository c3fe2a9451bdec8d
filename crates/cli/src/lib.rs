//! # feedvault-cli
//!
//! Command definitions and dispatch for the `feedvault` binary. The binary in
//! `main.rs` only sets up logging, parses arguments and reports the final error.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use feedvault::admin::{create_index, list_documents};
use feedvault::providers::store::OpenAiStoreProvider;
use feedvault::{AppConfig, JobRunner, RetryPolicy};
use feedvault_rss::RssFeedReader;
use tracing::{info, warn};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(name = "feedvault", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the feed and index its entries into the vector store, on a schedule
    Run(RunArgs),
    /// Create a new vector store and print its ID
    CreateStore(CreateStoreArgs),
    /// Print the filename of every file attached to a vector store
    ListFiles(ListFilesArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Feed URL to poll (overrides RSS_FEED_URL)
    #[arg(long)]
    pub feed_url: Option<String>,
    /// Target vector store (overrides VECTOR_STORE_ID)
    #[arg(long)]
    pub vector_store_id: Option<String>,
    /// Run a single pass and exit instead of scheduling
    #[arg(long)]
    pub once: bool,
}

#[derive(Parser, Debug)]
pub struct CreateStoreArgs {
    /// Display name of the new store (overrides FEEDVAULT_STORE_NAME)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ListFilesArgs {
    /// Vector store to inspect (overrides VECTOR_STORE_ID)
    #[arg(long)]
    pub vector_store_id: Option<String>,
}

// --- Command Handlers ---

/// Executes the parsed command against the given configuration.
pub async fn run(cli: Cli, mut config: AppConfig) -> Result<()> {
    match cli.command {
        Commands::Run(args) => {
            if args.feed_url.is_some() {
                config.feed_url = args.feed_url;
            }
            if args.vector_store_id.is_some() {
                config.vector_store_id = args.vector_store_id;
            }
            handle_run(&config, args.once).await
        }
        Commands::CreateStore(args) => {
            let name = args.name.unwrap_or_else(|| config.store_name.clone());
            let provider = OpenAiStoreProvider::from_config(&config)?;
            create_index(&provider, &name, &mut std::io::stdout()).await?;
            Ok(())
        }
        Commands::ListFiles(args) => {
            if args.vector_store_id.is_some() {
                config.vector_store_id = args.vector_store_id;
            }
            let store_id = config.require_store_id()?;
            let provider = OpenAiStoreProvider::from_config(&config)?;
            list_documents(&provider, &provider, store_id, &mut std::io::stdout()).await?;
            Ok(())
        }
    }
}

async fn handle_run(config: &AppConfig, once: bool) -> Result<()> {
    let job_config = config.job_config()?;
    let provider = OpenAiStoreProvider::from_config(config)?;
    let reader = RssFeedReader::new(config.request_timeout)?;

    let runner = JobRunner::new(
        Box::new(reader),
        Box::new(provider.clone()),
        Box::new(provider),
        job_config,
    )
    .with_retry_policy(RetryPolicy::with_max_retries(config.max_retries));

    if once {
        let report = runner.run_once().await?;
        info!(
            "Indexed {} of {} entries ({} skipped)",
            report.indexed.len(),
            report.fetched,
            report.skipped.len()
        );
        if !report.is_clean() {
            for failure in &report.failed {
                eprintln!(
                    "failed: {} ({})",
                    failure.link.as_deref().unwrap_or(&failure.title),
                    failure.error
                );
            }
            bail!("{} entries failed to index", report.failed.len());
        }
        return Ok(());
    }

    runner
        .run_scheduled(config.schedule_interval, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Unable to listen for ctrl-c, running until killed: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await;
    Ok(())
}
