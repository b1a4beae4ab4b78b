//! Axum server setup and router construction.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::api::{self, AppState};
use crate::sessions::SessionRegistry;
use crate::ws;

/// Build the full axum router.
///
/// The router serves:
/// - The page at `/`
/// - WebSocket at `/ws?session=<id>`
/// - REST API at `/api/*`
pub fn build_router(sessions: Arc<SessionRegistry>) -> Router {
    let app_state = AppState { sessions };

    // Lets a separately hosted page talk to the API.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(api::index))
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/state", get(api::get_state))
        .route("/api/presets", get(api::get_presets))
        .route("/api/mode", post(api::post_mode))
        .route("/api/generate", post(api::post_generate))
        .route("/api/regenerate", post(api::post_regenerate))
        .with_state(app_state)
        .layer(cors)
}

/// Bind the listener, start serving on a Tokio task, and return the bound address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> Result<SocketAddr, String> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| format!("failed to bind {bind_addr}: {e}"))?;
    let addr = listener
        .local_addr()
        .map_err(|e| format!("failed to read local address: {e}"))?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("Web server stopped: {e}");
        }
    });

    Ok(addr)
}
