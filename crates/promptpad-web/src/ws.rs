//! WebSocket upgrade handler and message dispatch.
//!
//! Clients connect to `/ws?session=<id>`. Each connection receives:
//! 1. A [`WsMessage::Snapshot`] of its page session on connect.
//! 2. A fresh snapshot after every event of that session.
//!
//! Clients may send `{"type":"set_mode","mode":"custom"}` back. Generation
//! itself goes through the REST endpoints.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use promptpad::session::{Mode, Session};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::api::{AppState, PageQuery};
use crate::broadcast::WsMessage;
use crate::sessions::{PageSession, RegistryError};

/// GET /ws — WebSocket upgrade handler.
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(app): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, RegistryError> {
    let page = app.sessions.get_or_create(&query.session)?;
    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, page))
        .into_response())
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, page: PageSession) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe before the initial snapshot so no update slips between them.
    let mut broadcast_rx = page.broadcast_tx.subscribe();

    let initial = WsMessage::snapshot(&page.session.state());
    if ws_send(&mut sink, &initial).await.is_err() {
        return;
    }

    debug!("WebSocket client connected");

    let session_for_resync = page.session.clone();
    let forward_task = tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(msg) => {
                    if ws_send(&mut sink, &msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged by {n} messages, resending snapshot");
                    let msg = WsMessage::snapshot(&session_for_resync.state());
                    if ws_send(&mut sink, &msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => handle_client_message(&text, &page.session),
            Message::Close(_) => break,
            _ => {}
        }
    }

    debug!("WebSocket client disconnected");
    forward_task.abort();
}

#[derive(serde::Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    SetMode { mode: Mode },
}

/// Process a JSON message received from a client.
fn handle_client_message(text: &str, session: &Session) {
    let Ok(msg) = serde_json::from_str::<ClientMessage>(text) else {
        debug!("Ignoring malformed WebSocket message");
        return;
    };

    match msg {
        ClientMessage::SetMode { mode } => session.set_mode(mode),
    }
}

/// Serialize a `WsMessage` and send it over the WebSocket sink.
async fn ws_send(sink: &mut SplitSink<WebSocket, Message>, msg: &WsMessage) -> Result<(), ()> {
    let json = serde_json::to_string(msg).unwrap_or_default();
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
