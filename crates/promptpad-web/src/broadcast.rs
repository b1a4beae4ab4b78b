//! [`SessionObserver`] that pushes session changes to WebSocket clients.
//!
//! [`BroadcastObserver`] turns every [`SessionEvent`] into a fresh
//! [`SessionSnapshot`] and sends it over that session's
//! `tokio::sync::broadcast` channel, so every socket of the page re-renders
//! from the same state.

use std::sync::{Arc, Mutex};

use promptpad::GenerationFailure;
use promptpad::session::{SessionEvent, SessionObserver, SessionSnapshot, SessionState};
use serde::Serialize;
use tokio::sync::broadcast;

/// A message sent from the server to WebSocket clients.
///
/// Discriminated on the `type` field when serialized to JSON.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Full state snapshot (on connect, after every session event, and after
    /// a lagging client resynchronizes).
    Snapshot { data: SessionSnapshot },
    /// An action was refused. Sent in addition to the snapshot because a
    /// refusal during a pending request does not change the output area.
    Rejected {
        kind: GenerationFailure,
        message: String,
    },
}

impl WsMessage {
    pub fn snapshot(state: &Arc<Mutex<SessionState>>) -> Self {
        let state = state.lock().unwrap_or_else(|e| e.into_inner());
        Self::Snapshot {
            data: SessionSnapshot::from_state(&state),
        }
    }
}

/// Observer that broadcasts session changes to WebSocket clients.
///
/// Compose alongside [`LoggingObserver`](promptpad::session::LoggingObserver):
///
/// ```ignore
/// let session = Session::new(client);
/// let observer = CompositeObserver::new()
///     .with(LoggingObserver)
///     .with(BroadcastObserver::new(ws_tx.clone(), session.state()));
/// let session = session.with_observer(observer);
/// ```
pub struct BroadcastObserver {
    sender: broadcast::Sender<WsMessage>,
    state: Arc<Mutex<SessionState>>,
}

impl BroadcastObserver {
    pub fn new(sender: broadcast::Sender<WsMessage>, state: Arc<Mutex<SessionState>>) -> Self {
        Self { sender, state }
    }
}

impl SessionObserver for BroadcastObserver {
    fn on_event(&self, event: &SessionEvent<'_>) {
        // Send errors only mean no client is connected.
        if let SessionEvent::Rejected(failure) = event {
            let _ = self.sender.send(WsMessage::Rejected {
                kind: *failure,
                message: failure.to_string(),
            });
        }
        let _ = self.sender.send(WsMessage::snapshot(&self.state));
    }
}
