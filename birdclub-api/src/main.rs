//! birdclub-api - Main entry point
//!
//! Serves membership role lookup, bird sightings and the event catalog.
//! Configuration priority: command line → environment → TOML → defaults.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use birdclub_common::config::{
    database_path, default_config_path, load_toml_config, resolve_api_key, resolve_root_folder,
    TomlConfig, DEFAULT_BIND_ADDRESS,
};
use birdclub_common::db::init_database;
use birdclub_api::db::SqliteRoleStore;
use birdclub_api::services::ebird_client::EBIRD_BASE_URL;
use birdclub_api::services::{EbirdClient, HttpEventFeed};
use birdclub_api::{build_router, AppState};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for birdclub-api
#[derive(Parser, Debug)]
#[command(name = "birdclub-api")]
#[command(about = "Membership, sightings and events service for the bird club")]
#[command(version)]
struct Args {
    /// Folder holding birdclub.db
    #[arg(short, long, env = "BIRDCLUB_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Address to listen on (host:port)
    #[arg(short, long, env = "BIRDCLUB_BIND")]
    bind: Option<String>,

    /// TOML config file (defaults to the platform config location)
    #[arg(short, long, env = "BIRDCLUB_CONFIG")]
    config: Option<PathBuf>,

    /// eBird API token
    #[arg(long, env = "BIRDCLUB_EBIRD_API_KEY", hide_env_values = true)]
    ebird_api_key: Option<String>,

    /// Event feed API key
    #[arg(long, env = "BIRDCLUB_EVENTS_API_KEY", hide_env_values = true)]
    events_api_key: Option<String>,

    /// Event feed base URL
    #[arg(long, env = "BIRDCLUB_EVENTS_URL")]
    events_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Read config before tracing so the configured level applies; problems
    // are reported once the subscriber is up
    let config_path = args.config.clone().or_else(default_config_path);
    let config_result = config_path.as_deref().map(load_toml_config);
    let toml_config = match &config_result {
        Some(Ok(config)) => config.clone(),
        _ => TomlConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting birdclub-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match (&config_path, &config_result) {
        (Some(path), Some(Ok(_))) => info!("Loaded config from {}", path.display()),
        (_, Some(Err(e))) => warn!("{} (continuing with defaults)", e),
        _ => info!("No config file found, using compiled defaults"),
    }

    // clap already folded BIRDCLUB_ROOT_FOLDER into args.root_folder
    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    let ebird_key = resolve_api_key(
        "eBird",
        args.ebird_api_key.as_deref(),
        toml_config.ebird.api_key.as_deref(),
    );
    let ebird_url = toml_config
        .ebird
        .base_url
        .clone()
        .unwrap_or_else(|| EBIRD_BASE_URL.to_string());
    let observation_feed =
        EbirdClient::new(ebird_url, ebird_key).context("Failed to build eBird client")?;

    let events_key = resolve_api_key(
        "Events",
        args.events_api_key.as_deref(),
        toml_config.events.api_key.as_deref(),
    );
    let events_url = args.events_url.clone().or_else(|| toml_config.events.base_url.clone());
    if events_url.is_none() {
        warn!("Event feed URL not configured; /api/events will answer 503");
    }
    let event_feed =
        HttpEventFeed::new(events_url, events_key).context("Failed to build event feed client")?;

    let state = AppState::new(
        Arc::new(SqliteRoleStore::new(pool)),
        Arc::new(observation_feed),
        Arc::new(event_feed),
    );
    let app = build_router(state);

    let bind = args
        .bind
        .or(toml_config.bind_address)
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("birdclub-api listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
