//! HTTP/WebSocket API for the Play Nine server.
//!
//! # Modules
//!
//! - [`tables`]: Joining tables and the lobby actions (start, reveal, leave)
//! - [`websocket`]: Live table views and in-game actions
//! - [`request_id`]: Request correlation header
//!
//! # Endpoints Overview
//!
//! - `GET  /health` - Server health status
//! - `POST /play9/join` - Join a table as a player, or as a viewer without a name
//! - `POST /play9/start` - Deal the first hole
//! - `POST /play9/reveal` - Flip one of the two opening cards
//! - `POST /play9/leave` - Give up a seat
//! - `GET  /play9/api/table/{table_name}` - Current public view
//! - `GET  /play9/ws/{table_name}?id=<player_id>` - Live connection
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use p9_server::api::{create_router, AppState};
//! use play_nine::{
//!     session::{SessionConfig, SessionRegistry},
//!     store::MemoryStore,
//!     table::{TableConfig, TableManager},
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(SessionRegistry::new(SessionConfig::default()));
//! let table_manager = Arc::new(TableManager::new(
//!     Arc::new(MemoryStore::new()),
//!     registry.clone(),
//!     TableConfig::default(),
//! ));
//! let app = create_router(AppState { table_manager, registry });
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod request_id;
pub mod tables;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use play_nine::{session::SessionRegistry, table::TableManager};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned for each request; both fields are `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Routes requests to per-table actors
    pub table_manager: Arc<TableManager>,
    /// Live connections, shared with the table actors
    pub registry: Arc<SessionRegistry>,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let play9_routes = Router::new()
        .route("/join", post(tables::join_table))
        .route("/start", post(tables::start_game))
        .route("/reveal", post(tables::reveal_card))
        .route("/leave", post(tables::leave_table))
        .route("/api/table/{table_name}", get(tables::get_table))
        .route("/ws/{table_name}", get(websocket::websocket_handler));

    Router::new()
        .route("/health", get(health_check))
        .nest("/play9", play9_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","tables":{"active_count":2}}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let active_count = state.table_manager.active_table_count().await;
    crate::metrics::active_tables(active_count);

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "tables": {
            "active_count": active_count
        },
    });

    (StatusCode::OK, Json(response))
}
