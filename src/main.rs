use axum::http::HeaderValue;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod crypto;
mod db;
mod error;
mod integrations;
mod models;
mod services;
mod utils;

use config::Config;
use services::{AuthService, ProfileGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arena_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Arena auth & profile server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Chain ID: {}", config.chain_id);

    let profile_store = services::profile_store_from_config(&config).await?;
    let challenge_store = services::challenge_store_from_config(&config).await?;
    let app_state = api::AppState {
        auth: AuthService::from_config(&config, challenge_store),
        profiles: ProfileGateway::new(profile_store, config.request_timeout()),
        config: config.clone(),
    };
    tracing::info!(
        "Profile store: {}, challenge store: {}",
        app_state.profiles.backend(),
        app_state.auth.challenge_backend()
    );

    let app = build_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/api/config", get(api::config::public_config))
        // Authentication
        .route("/api/auth", post(api::auth::handle))
        // Profiles
        .route("/api/profile", put(api::profile::upsert_profile))
        .route(
            "/api/profile/nickname-available",
            get(api::profile::nickname_available),
        )
        .route(
            "/api/profile/{wallet_address}",
            get(api::profile::get_profile),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
