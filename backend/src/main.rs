use std::sync::Arc;

use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

mod config;
mod cors;
mod db;
mod error;
mod handlers;
mod models;

use crate::config::Config;
use crate::cors::{cors_middleware, CorsHeaders};
use crate::db::DocumentStore;
use crate::handlers::items;

/// Shared application state. Holds nothing but the store handle.
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<dyn DocumentStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,inventory_functions=debug")
            }),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let cors = CorsHeaders::new(&config.cors)?;

    let store = db::connect(&config).await?;
    info!(collection = store.collection(), "Document store ready");

    let app = build_router(AppState { items: store }, cors);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on http://{}", addr);
    info!(origin = %config.cors.allowed_origin, "CORS origin");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState, cors: CorsHeaders) -> Router {
    Router::new()
        // ── Health ──────────────────────────────────────────────────────────
        .route("/health", get(handlers::health))

        // ── Function entry points (the handler checks the verb) ─────────────
        .route("/get", any(items::read))
        .route("/create", any(items::create))
        .route("/update", any(items::update))
        .route("/delete", any(items::delete))

        // ── Resource route ──────────────────────────────────────────────────
        .route(
            "/items",
            get(items::read)
                .post(items::create)
                .put(items::update)
                .delete(items::delete)
                .fallback(items::method_not_allowed),
        )

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(middleware::from_fn_with_state(cors, cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
