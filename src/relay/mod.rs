//! Relay: Axum HTTP service that signs house transactions.
//!
//! Exposes the house-side contract calls (set/accept offer, play round) and
//! an endpoint that prices and submits an offer in one step. CORS is open
//! so browser clients can call it directly.

pub mod client;
pub mod ledger;
pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

pub use client::{RelayClient, RelayReceipt};
pub use ledger::{OfferLedger, OfferRecord};
pub use routes::{AppState, RelayError, RelayState};

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/house/set-offer", post(routes::set_offer))
        .route("/api/house/generate-offer", post(routes::generate_offer))
        .route("/api/house/accept-offer", post(routes::accept_offer))
        .route("/api/house/play-round", post(routes::play_round))
        .route("/api/games/:id/offers", get(routes::get_game_offers))
        .route("/api/offers", get(routes::get_offers))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

/// Serve the relay until `shutdown` resolves.
pub async fn serve_relay<F>(state: AppState, port: u16, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind relay port {port}"))?;
    info!(port, "Relay server listening on http://localhost:{port}");

    serve_listener(listener, state, shutdown).await
}

/// Serve the relay on an already bound listener.
pub async fn serve_listener<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Relay server error")?;

    info!("Relay server stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
