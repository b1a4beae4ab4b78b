//! Per-page session registry.
//!
//! Every page instance mints its own id and passes it as `?session=<id>`.
//! The registry creates a fresh [`Session`] the first time an id is seen, so
//! one page never sees another page's mode, prompt or output. Each session
//! gets its own broadcast channel for `/ws` subscribers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use promptpad::session::{CompositeObserver, LoggingObserver, Session};
use promptpad::{GenerationBackend, SessionConfig};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use crate::broadcast::{BroadcastObserver, WsMessage};

/// Longest accepted session id.
pub const MAX_SESSION_ID_LEN: usize = 64;

/// Why a session id could not be resolved.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    #[error("session id must be 1-64 characters of [A-Za-z0-9_-]")]
    InvalidId,
    #[error("too many active sessions, try again later")]
    Full,
}

/// One page's session and the channel its WebSocket clients listen on.
#[derive(Clone)]
pub struct PageSession {
    pub session: Arc<Session>,
    pub broadcast_tx: broadcast::Sender<WsMessage>,
}

impl PageSession {
    /// In use by a handler or a socket, or waiting on a request.
    fn is_active(&self) -> bool {
        Arc::strong_count(&self.session) > 1
            || self.broadcast_tx.receiver_count() > 0
            || self.session.snapshot().loading
    }
}

/// Thread-safe map from page id to [`PageSession`].
///
/// All sessions share one backend and one [`SessionConfig`]. When the map is
/// full, idle sessions are dropped to make room; if none are idle, new ids
/// are refused with [`RegistryError::Full`].
pub struct SessionRegistry {
    backend: Arc<dyn GenerationBackend>,
    config: SessionConfig,
    broadcast_capacity: usize,
    max_sessions: usize,
    entries: Mutex<HashMap<String, PageSession>>,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            config: SessionConfig::default(),
            broadcast_capacity: 64,
            max_sessions: 1024,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    /// The session for `id`, created in its initial state on first use.
    pub fn get_or_create(&self, id: &str) -> Result<PageSession, RegistryError> {
        if !is_valid_id(id) {
            return Err(RegistryError::InvalidId);
        }

        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(page) = entries.get(id) {
            return Ok(page.clone());
        }

        if entries.len() >= self.max_sessions {
            let before = entries.len();
            entries.retain(|_, page| page.is_active());
            debug!("Pruned {} idle sessions", before - entries.len());
            if entries.len() >= self.max_sessions {
                return Err(RegistryError::Full);
            }
        }

        let page = self.create();
        entries.insert(id.to_string(), page.clone());
        debug!("Created session {id} ({} active)", entries.len());
        Ok(page)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn create(&self) -> PageSession {
        let (broadcast_tx, _) = broadcast::channel(self.broadcast_capacity.max(1));
        let session = Session::with_backend(self.backend.clone()).with_config(self.config);
        let observer = CompositeObserver::new()
            .with(LoggingObserver)
            .with(BroadcastObserver::new(broadcast_tx.clone(), session.state()));
        PageSession {
            session: Arc::new(session.with_observer(observer)),
            broadcast_tx,
        }
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
