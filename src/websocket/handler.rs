use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::{ClientMessage, ServerMessage};
use crate::AppState;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Create a channel for sending messages to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Register the client; ledger notifications arrive via the fan-out
    // task in main, which broadcasts to every registered client.
    let client_id = state.clients.register(tx);
    info!("WebSocket client connected: {}", client_id);

    // Forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                handle_message(&state, client_id, &text);
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket client disconnecting: {}", client_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                // Pong is handled automatically by axum
                debug!("Received ping from {}", client_id);
            }
            Err(e) => {
                warn!("WebSocket error for {}: {}", client_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up
    state.clients.unregister(client_id);
    send_task.abort();
    info!("WebSocket client disconnected: {}", client_id);
}

fn handle_message(state: &AppState, client_id: Uuid, text: &str) {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            send_to(state, client_id, &ServerMessage::Error {
                error: format!("Invalid message: {}", e),
            });
            return;
        }
    };

    match msg {
        ClientMessage::Ping => send_to(state, client_id, &ServerMessage::Pong),
    }
}

fn send_to(state: &AppState, client_id: Uuid, message: &ServerMessage) {
    if let Ok(json) = serde_json::to_string(message) {
        state.clients.send_to(client_id, &json);
    }
}
