//! Shelfwise: book recommendation and title matching service.
//!
//! Loads the rating catalog, builds the engine snapshot and serves it over HTTP.

use anyhow::Context;
use clap::Parser;
use shelfwise_api::{ApiServer, AppState};
use shelfwise_catalog::Catalog;
use shelfwise_core::config::{AppConfig, DataConfig};
use shelfwise_engine::Recommender;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Interval of the cache eviction sweep.
const CACHE_MAINTENANCE_SECS: u64 = 60;

#[derive(Parser, Debug)]
#[command(name = "shelfwise")]
#[command(about = "Book recommendation and title matching service")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(long, env = "SHELFWISE_CONFIG")]
    config: Option<String>,

    /// Directory holding books.json, users.json and ratings.json
    #[arg(long, env = "SHELFWISE__DATA__DATA_PATH")]
    data_path: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "SHELFWISE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Minimum ratings a book needs to be kept
    #[arg(long)]
    min_book_ratings: Option<usize>,

    /// Minimum ratings a user needs to be kept
    #[arg(long)]
    min_user_ratings: Option<usize>,
}

fn load_catalog(data: &DataConfig) -> anyhow::Result<Catalog> {
    let raw = Catalog::load(&data.data_path)
        .with_context(|| format!("loading catalog from {}", data.data_path))?;
    let (books, users, ratings) = (raw.books.len(), raw.users.len(), raw.ratings.len());
    let catalog = raw.prepare(data.min_book_ratings, data.min_user_ratings);

    info!(
        books_loaded = books,
        users_loaded = users,
        ratings_loaded = ratings,
        books_kept = catalog.books.len(),
        users_kept = catalog.users.len(),
        ratings_kept = catalog.ratings.len(),
        "Catalog prepared"
    );
    Ok(catalog)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelfwise=info,shelfwise_engine=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Shelfwise starting up");

    // Load configuration
    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(path) = cli.data_path {
        config.data.data_path = path;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(min) = cli.min_book_ratings {
        config.data.min_book_ratings = min;
    }
    if let Some(min) = cli.min_user_ratings {
        config.data.min_user_ratings = min;
    }

    info!(
        data_path = %config.data.data_path,
        http_port = config.api.http_port,
        min_book_ratings = config.data.min_book_ratings,
        min_user_ratings = config.data.min_user_ratings,
        "Configuration loaded"
    );

    let catalog = load_catalog(&config.data)?;
    let recommender =
        Recommender::build(&catalog, &config.engine).context("building engine snapshot")?;

    let state = AppState::new(config.clone(), catalog, recommender);
    let api_server = ApiServer::new(state.clone());

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics() {
        error!(error = %e, "Failed to start metrics exporter");
    }

    // Spawn cache maintenance task
    let cache = state.cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(CACHE_MAINTENANCE_SECS));
        loop {
            interval.tick().await;
            cache.evict_expired();
        }
    });

    // Spawn periodic rebuild task
    let refresh_secs = config.engine.refresh_interval_secs;
    if refresh_secs > 0 {
        let state = state.clone();
        let data = config.data.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(refresh_secs));
            interval.tick().await;
            loop {
                interval.tick().await;
                let state = state.clone();
                let data = data.clone();
                let outcome = tokio::task::spawn_blocking(move || -> anyhow::Result<u64> {
                    let catalog = load_catalog(&data)?;
                    let generation = state.recommender.rebuild(&catalog)?;
                    *state.catalog.write() = Arc::new(catalog);
                    state.cache.clear();
                    Ok(generation)
                })
                .await;
                match outcome {
                    Ok(Ok(generation)) => info!(generation, "Periodic rebuild complete"),
                    Ok(Err(e)) => error!(error = %e, "Periodic rebuild failed"),
                    Err(e) => error!(error = %e, "Periodic rebuild task panicked"),
                }
            }
        });
        info!(refresh_secs, "Periodic rebuild enabled");
    }

    info!("Shelfwise is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
