//! WebSocket handler for viewer connections
//!
//! The push channel is server-to-client only: incoming frames other than
//! `Close` are ignored. Each upgraded socket gets its own `ConnectionSession`
//! so the listener never blocks on session initialization.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

use terraview_core::models::AccountId;

use super::session::ConnectionSession;
use crate::server::AppState;

/// Query parameters for WebSocket connection
///
/// The account identifier is supplied per connection, never ambient state.
/// A missing or unparseable `account` is rejected with 400 before upgrade.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub account: i64,
}

/// WebSocket handler for viewer real-time updates
///
/// Clients connect with their account id as a query parameter:
/// `ws://host:port/ws?account={account_id}`
pub async fn websocket_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let account_id = AccountId::from(query.account);
    ws.on_upgrade(move |socket| handle_socket(socket, state, account_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, account_id: AccountId) {
    let connection_id = nanoid::nanoid!(12);
    info!(
        connection_id = %connection_id,
        account_id = %account_id,
        "Viewer connected"
    );

    let mut rx = state.hub.register(connection_id.clone());
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Writer task: hub channel -> socket. Exits when the hub entry is removed
    // (channel closed) or the socket rejects a send.
    let writer_connection_id = connection_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if let Err(e) = ws_sink.send(Message::Text(payload.to_string().into())).await {
                warn!(
                    connection_id = %writer_connection_id,
                    error = %e,
                    "Failed to send reading to viewer, stopping writer"
                );
                break;
            }
        }
    });

    let mut session = ConnectionSession::new(
        connection_id.clone(),
        account_id,
        state.source.clone(),
        state.hub.clone(),
        state.poll_interval,
    );
    session.initialize().await;
    let poll_task = session.spawn_poll_task();

    // Read loop: there is no client-to-relay protocol, so only closure and
    // errors matter.
    while let Some(frame) = ws_stream.next().await {
        match frame {
            Ok(Message::Close(_)) => {
                debug!(connection_id = %connection_id, "Viewer sent close frame");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(
                    connection_id = %connection_id,
                    error = %e,
                    "WebSocket read error"
                );
                break;
            }
        }
    }

    // Cancel the poll timer and deregister; a tick already in flight may
    // finish and publish to the remaining connections.
    session.close();
    let _ = writer.await;
    let _ = poll_task.await;

    info!(connection_id = %connection_id, "Viewer disconnected");
}
