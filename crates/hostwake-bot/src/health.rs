//! Health and readiness endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use hostwake_store::Store;
use serde::Serialize;

/// Application state shared across handlers.
pub struct AppState<S: Store> {
    store: Arc<S>,
}

impl<S: Store> AppState<S> {
    /// Create state over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: "hostwake",
    })
}

async fn ready_handler<S: Store + 'static>(State(state): State<AppState<S>>) -> impl IntoResponse {
    match state.store.list_host_settings() {
        Ok(_) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!(error = %e, "Store not ready");
            (StatusCode::SERVICE_UNAVAILABLE, "store unavailable")
        }
    }
}

fn create_router<S: Store + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler::<S>))
        .with_state(state)
}

/// Serve the health endpoints until the process exits.
pub async fn serve<S: Store + 'static>(listen_addr: String, store: Arc<S>) -> std::io::Result<()> {
    let app = create_router(AppState::new(store));
    tracing::info!(listen_addr = %listen_addr, "Starting health server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await
}
