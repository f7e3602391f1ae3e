//! Trailhead: a backend bootstrap.
//!
//! This is the application entry point. It loads `.env` and configuration,
//! initializes tracing, builds the `users` collection spec, sets up the Axum
//! router, and starts the HTTP server, which opens the datastores once bound.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trailhead::config::{AppConfig, DEFAULT_LOG_FILTER};
use trailhead::http::start_server;
use trailhead::schema::users_collection_spec;
use trailhead::{create_router, AppState};

/// Trailhead: HTTP API bootstrap for MongoDB, MySQL and Redis
#[derive(Parser, Debug)]
#[command(name = "trailhead", version, about)]
struct Args {
    /// Path to configuration file (defaults to config/default.toml when present)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level filter (e.g., "trailhead=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // A missing .env file is fine; variables may come from the real environment
    let dotenv = dotenvy::dotenv();

    let config = AppConfig::load(args.config.as_deref())?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    tracing::info!(
        environment = %config.environment,
        mongo_database = %config.mongo.database,
        "Loaded configuration"
    );

    let users = users_collection_spec()?;
    let state = AppState::new(config);
    let app = create_router(state.clone());

    start_server(app, &state, users).await?;

    Ok(())
}
