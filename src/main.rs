// src/main.rs

// --- Modules ---
mod config;
mod db;
mod error;
mod models;
mod services;
mod state;
mod throttle;
mod web;

#[cfg(test)]
mod tests;

// --- Imports ---
use crate::{config::Config, db::DocumentStore, state::AppState};
use axum::serve;
use std::{env, net::SocketAddr};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Logging ---
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            env::var("RUST_LOG")
                .unwrap_or_else(|_| "campuspro=debug,tower_http=info,sqlx=warn".into())
                .into()
        }))
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Starting CampusPro+ server...");

    // --- Configuration ---
    let config = Config::from_env()?;
    error::set_development_mode(config.development);

    // --- Database ---
    let db_pool = match db::create_db_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Failed to initialise the database: {}", e);
            return Err(anyhow::anyhow!("database connection/migration failed: {}", e));
        }
    };
    let store = DocumentStore::new(db_pool, config.storage_timeout);

    // --- Application state ---
    let port = config.port;
    let app_state = AppState::new(store, config);

    // --- Listener ---
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Failed to bind port {}: {}", port, e);
            return Err(e.into());
        }
    };
    tracing::info!("📡 Listening on http://{}", addr);

    // --- Router & layers ---
    let app = web::routes::create_router(app_state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    if let Err(e) = serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await {
        tracing::error!("❌ Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
