mod api;
mod config;
mod error;
mod models;
mod services;

use crate::api::AppState;
use crate::config::Config;
use crate::services::{AccountStore, SpotifyClient};
use axum::http::{header, HeaderValue, Method};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,music_transfer=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let accounts = AccountStore::load(config.accounts_file.clone()).await?;
    let spotify = Arc::new(SpotifyClient::new(config.api_base.clone()));

    let cors = cors_layer(&config.cors_origins);
    let addr = format!("{}:{}", config.server_host, config.server_port);

    let app_state = Arc::new(AppState::new(config, spotify, accounts));

    let app = api::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS allows any origin");
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}
