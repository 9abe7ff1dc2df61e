//! WebSocket handler for live table views.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /play9/ws/{table_name}?id=<player_id>`
//!    (no `id` for viewers)
//! 2. The table name is validated before the upgrade
//! 3. The connection is registered; a player who is already connected
//!    elsewhere gets an error and the socket is closed
//! 4. Everyone at the table receives the view with the new presence list
//! 5. A writer task forwards table broadcasts and direct replies; the
//!    reader loop handles client messages
//! 6. On disconnect the connection is dropped and the table rebroadcast.
//!    The player keeps their seat until the inactivity sweep removes them.
//! 7. A connection the stale sweep dropped is closed from the server side;
//!    a heartbeat arriving after that also ends the session.
//!
//! # Client Messages
//!
//! JSON objects tagged by `type`:
//! - `ping`: reply with the current view
//! - `heartbeat`: same, and mark the connection alive
//! - any game action (`start`, `reveal`, `draw_from_draw`, ...)
//!
//! Accepted actions reach every viewer through the table broadcast.
//! Failures go only to the sender as `{"error": "..."}`.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/play9/ws/sunday?id=8d2c...');
//! setInterval(() => ws.send(JSON.stringify({ type: "heartbeat" })), 5000);
//! ws.send(JSON.stringify({ type: "play_discard_flip", card_index: 3 }));
//! ```

use axum::{
    Json,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use play_nine::{
    PlayerId, TableName,
    protocol::{Command, ErrorMessage},
    session::ConnectionId,
};
use serde::Deserialize;
use std::{fmt, time::Duration};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{AppState, tables::ErrorResponse};
use crate::{logging, metrics};

/// Capacity of the per-socket queue for direct replies.
const REPLY_BUFFER: usize = 16;

/// How long the writer may take to flush and close after the reader stops.
const WRITER_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    id: Option<String>,
}

/// Who is on the other end of a socket.
#[derive(Clone, Debug)]
pub struct Session {
    pub table: TableName,
    pub player_id: Option<PlayerId>,
    pub connection: ConnectionId,
}

/// Upgrade HTTP connection to WebSocket for a live table view.
///
/// # Response
///
/// On success, upgrades connection to WebSocket protocol (101 Switching Protocols).
/// An invalid table name returns `400 Bad Request` without upgrading, even
/// for requests that could not have been upgraded anyway.
pub async fn websocket_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Path(table_name): Path<String>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let table = match TableName::parse(&table_name) {
        Ok(table) => table,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    detail: e.to_string(),
                }),
            )
                .into_response();
        }
    };
    let player_id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .map(PlayerId::from);

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };
    ws.on_upgrade(move |socket| handle_socket(socket, table, player_id, state))
}

/// Drive an established WebSocket connection until either side closes it.
///
/// The server side closes the socket once the registry drops the
/// connection's outbound channel, which is what a stale sweep does.
async fn handle_socket(
    socket: WebSocket,
    table: TableName,
    player_id: Option<PlayerId>,
    state: AppState,
) {
    let (mut sender, mut receiver) = socket.split();

    let (outbound_tx, mut outbound_rx) = state.registry.channel();
    let connection = match state
        .registry
        .connect(&table, player_id.clone(), outbound_tx)
        .await
    {
        Ok(connection) => connection,
        Err(e) => {
            info!("WebSocket refused: table={table}, reason={e}");
            let _ = sender.send(Message::Text(error_json(&e).into())).await;
            let _ = sender.close().await;
            return;
        }
    };
    let session = Session {
        table: table.clone(),
        player_id,
        connection,
    };

    metrics::websocket_connections_total();
    metrics::websocket_connections_active(1.0);
    info!("WebSocket connected: table={table}, connection={connection}");

    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(REPLY_BUFFER);

    let mut send_task = tokio::spawn(async move {
        loop {
            let text = tokio::select! {
                biased;
                Some(reply) = reply_rx.recv() => reply,
                update = outbound_rx.recv() => match update {
                    Some(update) => update.to_string(),
                    None => break,
                },
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                return;
            }
            metrics::websocket_messages_sent();
        }
        let _ = sender.close().await;
    });

    // Everyone, including the newcomer, sees the updated presence list.
    if let Err(e) = state.table_manager.rebroadcast(&table).await {
        warn!("Table '{table}': rebroadcast on connect failed: {e}");
    }

    let mut received = 0u64;
    let mut writer_done = false;
    loop {
        let msg = tokio::select! {
            msg = receiver.next() => msg,
            _ = &mut send_task => {
                writer_done = true;
                break;
            }
        };
        match msg {
            Some(Ok(Message::Text(text))) => {
                received += 1;
                metrics::websocket_messages_received();
                match handle_command(&state, &session, text.as_str()).await {
                    Reply::Nothing => {}
                    Reply::Text(reply) => {
                        if reply_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                    Reply::Close(reply) => {
                        let _ = reply_tx.send(reply).await;
                        break;
                    }
                }
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(e)) => {
                debug!("WebSocket error on {connection}: {e}");
                break;
            }
            Some(Ok(_)) => {}
        }
    }

    drop(reply_tx);
    let was_registered = state.registry.disconnect(connection, &table).await;
    if !was_registered {
        info!("WebSocket {connection} on table={table} was dropped by the server");
    }
    if !writer_done && tokio::time::timeout(WRITER_GRACE, &mut send_task).await.is_err() {
        send_task.abort();
    }

    metrics::websocket_connections_active(-1.0);
    if let Err(e) = state.table_manager.rebroadcast(&table).await {
        warn!("Table '{table}': rebroadcast on disconnect failed: {e}");
    }

    logging::log_session_closed(
        table.as_str(),
        session.player_id.as_ref().map(PlayerId::as_str),
        received,
    );
}

/// What to send back to the client that sent a message.
#[derive(Debug, PartialEq)]
pub enum Reply {
    /// Nothing; an accepted action reaches the sender through the table broadcast
    Nothing,
    Text(String),
    /// Send this, then end the session
    Close(String),
}

/// Handle one client message.
pub async fn handle_command(state: &AppState, session: &Session, raw: &str) -> Reply {
    let command = match Command::parse(raw) {
        Ok(command) => command,
        Err(e) => return Reply::Text(error_json(&e)),
    };

    match command {
        Command::Ping => Reply::Text(view_json(state, &session.table).await),
        Command::Heartbeat => match state.registry.record_heartbeat(session.connection).await {
            Ok(()) => Reply::Text(view_json(state, &session.table).await),
            Err(e) => {
                info!("Heartbeat after the connection was dropped: {e}");
                Reply::Close(error_json(&e))
            }
        },
        Command::Action(action) => {
            let kind = action.tag();
            let result = state
                .table_manager
                .act(&session.table, session.player_id.clone(), action)
                .await;
            metrics::actions_total(kind, result.is_ok());
            match result {
                Ok(_) => Reply::Nothing,
                Err(e) => {
                    logging::log_rejected_action(session.table.as_str(), kind, &e.to_string());
                    Reply::Text(error_json(e.client_message()))
                }
            }
        }
    }
}

async fn view_json(state: &AppState, table: &TableName) -> String {
    match state.table_manager.view(table).await {
        Ok(view) => serde_json::to_string(&view).unwrap_or_else(|e| error_json(e)),
        Err(e) => error_json(e.client_message()),
    }
}

fn error_json(error: impl fmt::Display) -> String {
    serde_json::to_string(&ErrorMessage::new(error))
        .unwrap_or_else(|_| r#"{"error":"Internal error"}"#.to_string())
}
