use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kyhunt_core::{
    load_config, validate_config, CommandOutcome, LibraryItem, RadarrClient, RemoteClient,
    SanitizedConfig, UpgradeEngine,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("KYHUNT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default();
    info!("Configuration loaded: {}", sanitized);

    let radarr = RadarrClient::new(config.radarr.clone()).context("Failed to create Radarr client")?;
    radarr
        .check_connection()
        .await
        .with_context(|| format!("Cannot reach Radarr at {}", config.radarr.url))?;
    info!("Connected to Radarr at {}", config.radarr.url);

    let client: Arc<dyn RemoteClient> = Arc::new(radarr);
    let engine = UpgradeEngine::new(client, &config);

    match engine.library().queue_size().await {
        Ok(size) => info!("Download queue size: {}", size),
        Err(e) => warn!("Could not read download queue size: {}", e),
    }

    let discovery = engine.discover().await;
    if discovery.is_degraded() {
        warn!(
            "Discovery degraded ({} failures); continuing with {} candidates",
            discovery.causes().len(),
            discovery.len()
        );
    }

    let selected = select_for_search(discovery.into_items(), config.discovery.random_sample_count);
    if selected.is_empty() {
        info!("No upgrade candidates found");
        return Ok(());
    }

    for movie in &selected {
        info!("Searching for upgrade: {} (id {})", movie.label(), movie.id);
    }

    let outcome = engine
        .search(&selected)
        .await
        .context("Failed to trigger search command")?;

    match outcome {
        CommandOutcome::Completed => info!("Search completed for {} movies", selected.len()),
        CommandOutcome::Failed => warn!("Radarr reported the search command as failed"),
        CommandOutcome::TimedOut => {
            warn!("Search command still running after the polling budget; not waiting further")
        }
    }

    Ok(())
}

/// Pick at most `limit` candidates, in discovery order.
fn select_for_search(candidates: Vec<LibraryItem>, limit: usize) -> Vec<LibraryItem> {
    candidates.into_iter().take(limit).collect()
}
