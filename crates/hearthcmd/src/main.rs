use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hearthcmd::AccessoryHost;
use hearthcmd::CommandHandler;
use hearthcmd::CompletionService;
use hearthcmd::Config;
use hearthcmd::Inventory;
use hearthcmd::SharedCommandHandler;
use hearthcmd::completion::OpenAiCompletion;
use hearthcmd::dispatch::InventoryHost;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Natural-language command dispatch for smart home devices
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(default_value = "hearthcmd.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(config.logging.targets())
        .init();

    tracing::info!("hearthcmd starting");
    tracing::info!("Loaded config from: {}", args.config.display());

    let inventory = Arc::new(Inventory::new(config.devices.clone()));
    tracing::info!("Inventory loaded with {} device(s)", inventory.snapshot().len());

    if config.completion.api_key().is_none() {
        tracing::warn!(
            "No API key configured for {}, requests will be sent unauthenticated",
            config.completion.endpoint
        );
    }
    let completion: Arc<dyn CompletionService> = Arc::new(
        OpenAiCompletion::new(&config.completion).context("Failed to create completion client")?,
    );
    let host: Arc<dyn AccessoryHost> = Arc::new(InventoryHost::new(inventory.clone()));
    let handler = Arc::new(CommandHandler::new(inventory, completion, host, &config));

    // Wait for Ctrl+C in the background and stop the server on it
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received shutdown signal");
        let _ = shutdown_tx.send(());
    });

    serve_api(&config, handler, shutdown_rx).await?;

    tracing::info!("hearthcmd shutdown complete");

    Ok(())
}

async fn serve_api(
    config: &Config,
    handler: Arc<SharedCommandHandler>,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    hearthcmd::api::serve(
        config.api.listen.clone(),
        config.api.port,
        handler,
        shutdown_rx,
    )
    .await
    .map_err(|e| anyhow::anyhow!(e))
    .context("HTTP API server failed")
}
