//! Browser front end for promptpad generation sessions.
//!
//! `promptpad-web` serves a single page plus the REST and WebSocket endpoints
//! it talks to. The page only renders; all state lives in one
//! [`Session`](promptpad::session::Session) per page instance.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use promptpad::prelude::*;
//! use promptpad_web::{WebConfig, spawn_web};
//!
//! let backend: Arc<dyn GenerationBackend> =
//!     Arc::new(GeminiClient::new(GenerationConfig::from_env())?);
//! let addr = spawn_web(backend, SessionConfig::default(), WebConfig::default()).await?;
//! println!("Open http://{addr}");
//! ```
//!
//! # Architecture
//!
//! Each page load mints a random id and sends it as `?session=<id>`. The
//! [`SessionRegistry`] creates a fresh session for every new id, so pages
//! never share state.
//!
//! ```text
//! page ──POST /api/*?session=id──▶ SessionRegistry ──▶ Session ──▶ Gemini
//!   ▲                                                     │
//!   └──── /ws?session=id snapshots ◀── BroadcastObserver ◀┘
//! ```

mod api;
pub mod broadcast;
mod server;
pub mod sessions;
mod ws;

pub use api::status_for;
pub use broadcast::{BroadcastObserver, WsMessage};
pub use sessions::{PageSession, RegistryError, SessionRegistry};

use std::net::SocketAddr;
use std::sync::Arc;

use promptpad::{GenerationBackend, SessionConfig};

/// Configuration for the web server.
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3001`.
    pub bind_addr: SocketAddr,
    /// Per-session WebSocket broadcast channel capacity. Default: 64.
    ///
    /// Clients that fall behind by this many messages receive a fresh
    /// snapshot to resynchronize.
    pub broadcast_capacity: usize,
    /// Most page sessions kept at once. Default: 1024.
    ///
    /// Idle sessions are dropped when the limit is reached.
    pub max_sessions: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            broadcast_capacity: 64,
            max_sessions: 1024,
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// The server runs until the Tokio runtime shuts down.
///
/// # Arguments
///
/// * `backend` — Shared by every page session.
/// * `session_config` — Applied to every page session.
/// * `config` — Server configuration.
pub async fn spawn_web(
    backend: Arc<dyn GenerationBackend>,
    session_config: SessionConfig,
    config: WebConfig,
) -> Result<SocketAddr, String> {
    let sessions = SessionRegistry::new(backend)
        .with_config(session_config)
        .with_broadcast_capacity(config.broadcast_capacity)
        .with_max_sessions(config.max_sessions);
    let router = server::build_router(Arc::new(sessions));
    server::start_server(router, config.bind_addr).await
}
