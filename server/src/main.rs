//! RoomSense Server
//!
//! Hosts the subscriber WebSocket and the operator endpoints, and drives the
//! upstream ingestion loop.
//!
//! # Architecture
//!
//! ```text
//!  presence gateway ──ws──► ingest ──► AppContext ──► /ws subscribers
//!        │                               ▲
//!        └──rest /entities──► bootstrap  │ /api/* (room, gathering, training, status)
//! ```

mod config;
mod error;
mod handlers;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roomsense_core::constants::DataPaths;
use roomsense_core::logic::directory::{self, DirectoryClient};
use roomsense_core::logic::ingest::{IngestClient, IngestPipeline};
use roomsense_core::logic::training::ForestFitter;
use roomsense_core::AppContext;

pub use error::AppResult;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (library `log` records are bridged in)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "roomsense_server=debug,roomsense_core=info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("RoomSense Server starting...");
    tracing::info!("Directory: {} | Events: {}", config.rest_url, config.ws_url);

    // Anchors and devices come from the directory
    let directory = DirectoryClient::new(&config.rest_url)
        .context("Failed to create directory client")?;
    let entities = directory.fetch_entities().await
        .context("Failed to load entity directory")?;
    let anchors = directory::anchors_from(&entities, &config.anchor_entity_id)
        .context("Failed to build anchor set")?;

    let fitter = Arc::new(ForestFitter::new(config.training.clone()));
    let ctx = Arc::new(AppContext::new(anchors, DataPaths::in_dir(&config.data_dir), fitter));
    ctx.refresh_devices(&entities, &config.anchor_entity_id);

    match ctx.load_model() {
        Ok(true) => tracing::info!("Model loaded from {:?}", ctx.paths.model),
        Ok(false) => tracing::warn!("No model yet - predictions start after the first training run"),
        Err(e) => tracing::warn!("Model at {:?} rejected: {}", ctx.paths.model, e),
    }

    // Build application state
    let state = AppState {
        ctx: Arc::clone(&ctx),
        directory: Arc::new(directory),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    let ingest = IngestClient::new(&config.ws_url);
    let pipeline = IngestPipeline::new(ctx);

    // Losing the upstream stream is fatal; no reconnect
    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result.context("HTTP server failed")?;
        }
        result = ingest.run(pipeline) => {
            if let Err(e) = result {
                tracing::error!("Ingestion stopped: {}", e);
                return Err(anyhow::Error::new(e).context("Upstream event stream lost"));
            }
        }
    }

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<AppContext>,
    pub directory: Arc<DirectoryClient>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/entities", get(handlers::entities::list))
        .route("/api/room", post(handlers::room::assign))
        .route(
            "/api/gathering",
            post(handlers::gathering::update).delete(handlers::gathering::delete),
        )
        .route(
            "/api/training",
            post(handlers::training::start).delete(handlers::training::cancel),
        )
        .route("/api/status", get(handlers::status::get));

    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/ws", get(handlers::ws::upgrade))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
