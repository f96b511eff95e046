use serde::{Deserialize, Serialize};

/// Incoming WebSocket message from client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Liveness check.
    Ping,
}

/// Outgoing WebSocket message to client.
///
/// Change notifications deliberately carry no ledger payload: consumers
/// re-fetch the dashboard snapshot so they never depend on ledger internals.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The account ledger changed; re-fetch the dashboard.
    LedgerChanged,
    /// A persistence write failed; in-memory state is live but unsaved.
    SaveWarning { message: String },
    Pong,
    Error { error: String },
}
