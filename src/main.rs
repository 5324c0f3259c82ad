use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod codegen;
mod config;
mod error;
mod geo;
mod handlers;
mod models;
mod shortener;
mod store;

use geo::GeoCache;
use shortener::Shortener;
use store::{JsonFileStore, MemoryStore, UrlStore};

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    pub config: config::AppConfig,
    pub shortener: Shortener,
    /// In-memory cache for IP → location lookups so the same IP is never
    /// looked up more than once per server lifetime.
    pub geo_cache: GeoCache,
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (ignore error if file is absent — env vars may already be set)
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "linklet=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = config::AppConfig::from_env()?;
    tracing::info!("Starting linklet on {}:{}", config.host, config.port);
    tracing::info!("Base URL: {}", config.base_url);
    tracing::info!("Store path: {}", config.store_path);

    // Open the whole-collection store and report what it holds
    let store: Arc<dyn UrlStore> = if config.store_path == ":memory:" {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::new(&config.store_path))
    };
    let existing = store.load().await?;
    tracing::info!("Store loaded with {} record(s)", existing.len());

    // Build shared state
    let shortener = Shortener::new(store, config.base_url.clone());
    let geo_cache = GeoCache::new();

    let state = Arc::new(AppState {
        config,
        shortener,
        geo_cache,
    });

    // ── Router ─────────────────────────────────────────────────────────────
    let api_router = Router::new()
        .route("/shorten", post(handlers::shorten::shorten))
        .route("/links", get(handlers::stats::list))
        .route("/links/:code", get(handlers::stats::show));

    let app = Router::new()
        // Health check — returns 200 OK with no body
        .route("/health", get(|| async { axum::http::StatusCode::OK }))
        // JSON API (all under /api/*)
        .nest("/api", api_router)
        // Short-link redirect — must come LAST so /api/* takes priority
        .route("/:code", get(handlers::redirect::redirect))
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http());

    // ── Serve ──────────────────────────────────────────────────────────────
    let bind_addr = format!("{}:{}", state.config.host, state.config.port);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
