//! HTTP chat transport for Recollect.
//!
//! # Endpoints
//!
//! - `GET /` - chat page
//! - `GET /health` - liveness and session count
//! - `POST /api/sessions` - log in and open a session
//! - `POST /api/sessions/{id}/messages` - send a message, reply streamed as SSE
//! - `DELETE /api/sessions/{id}` - close a session

pub mod error;
pub mod routes;
pub mod sse;
pub mod state;

use axum::Router;
use axum::routing::{delete, get, post};
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;

pub use error::{ApiError, ServerError};
pub use sse::SseTransport;
pub use state::AppState;

/// Create the router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/api/sessions", post(routes::create_session))
        .route("/api/sessions/{id}", delete(routes::delete_session))
        .route("/api/sessions/{id}/messages", post(routes::send_message))
        .with_state(state)
}

/// Serve the chat UI and API on `addr` until the process stops.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<(), ServerError> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ServerError::Bind(addr, err))?;
    info!("serving chat UI (addr={})", addr);
    axum::serve(listener, router).await.map_err(ServerError::Serve)?;
    Ok(())
}
