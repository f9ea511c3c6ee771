//! Web server — axum routes for the violation report.
//!
//! Read-only: handlers take snapshots of the shared ledger, the poller owns
//! all mutation. The root path serves the embedded dashboard page.

use std::sync::{Arc, RwLock};

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use nestwatch_core::ViolationLedger;

pub mod pages;
pub mod routes;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub ledger: Arc<RwLock<ViolationLedger>>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", axum::routing::get(pages::page_index))
        .route(
            "/api/violations",
            axum::routing::get(routes::api_violations),
        )
        .with_state(state)
        .layer(cors)
}

/// Start the web server.
pub async fn serve(
    ledger: Arc<RwLock<ViolationLedger>>,
    host: &str,
    port: u16,
) -> std::io::Result<()> {
    let state = Arc::new(AppState { ledger });
    let app = build_router(state);
    let addr = format!("{host}:{port}");

    tracing::info!("violation report available on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}
