//! In-memory plot registry server.
//!
//! SYSTEM CONTEXT
//! ==============
//! Serves the HTTP contract the registry client speaks: `GET`/`POST
//! /api/plots` plus `/health`. Plots live in memory for the life of the
//! process. When `REGISTRY_TOKEN` is set every plot route requires the
//! matching bearer token.

pub mod plots;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::geo::Plot;

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Bearer token required on plot routes; `None` leaves them open.
    pub token: Option<String>,
}

impl ServerConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 5000
    /// - `REGISTRY_TOKEN`: require this bearer token
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let token = lookup("REGISTRY_TOKEN").filter(|t| !t.trim().is_empty());
        Self { port, token }
    }
}

/// Shared state injected into handlers. Clone is required by Axum.
#[derive(Clone, Default)]
pub struct RegistryState {
    pub plots: Arc<RwLock<Vec<Plot>>>,
    pub token: Option<String>,
}

impl RegistryState {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self { plots: Arc::new(RwLock::new(Vec::new())), token }
    }
}

/// Registry routes with permissive CORS and request tracing.
pub fn app(state: RegistryState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(plots::health))
        .route("/api/plots", get(plots::list_plots).post(plots::register_plot))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `0.0.0.0:{port}` and serve until the process exits.
///
/// # Errors
///
/// Returns an I/O error if the port cannot be bound or serving fails.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let state = RegistryState::new(config.token.clone());
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, auth = config.token.is_some(), "plot registry listening");
    axum::serve(listener, app(state)).await
}
