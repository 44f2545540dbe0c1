// ABOUTME: Server bootstrap for the reqtrack HTTP API
// ABOUTME: Loads configuration, opens the database and serves the router with CORS and request tracing

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use reqtrack_ai::{AIService, AnthropicGenerator};
use reqtrack_api::{create_router, DbState};
use reqtrack_storage::DatabaseConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod config;

#[cfg(test)]
mod tests;

use config::Config;

/// Command-line overrides applied on top of the environment
#[derive(Debug, Default, Clone)]
pub struct ServeOptions {
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    pub in_memory: bool,
}

pub async fn run_server(options: ServeOptions) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = Config::from_env()?;
    if let Some(port) = options.port {
        config.port = port;
    }
    if let Some(database) = options.database {
        config.database_path = database;
    }

    let pool = if options.in_memory {
        warn!("Using an in-memory database; nothing will be persisted");
        reqtrack_storage::connect_in_memory().await?
    } else {
        info!("Database: {}", config.database_path.display());
        reqtrack_storage::connect(&DatabaseConfig::with_path(&config.database_path)).await?
    };

    let mut state = DbState::new(pool);
    match config.ai_config() {
        Some(ai_config) => {
            info!("AI generation enabled (model: {})", ai_config.model);
            let generator = AnthropicGenerator::new(AIService::new(ai_config));
            state = state.with_generator(Arc::new(generator));
        }
        None => info!("ANTHROPIC_API_KEY not set; AI generation endpoints will answer 503"),
    }

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let host: IpAddr = config.host.parse()?;
    let addr = SocketAddr::new(host, config.port);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
