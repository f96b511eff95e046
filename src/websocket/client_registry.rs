use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Registry of connected WebSocket clients.
///
/// There is one account, so there are no per-topic rooms: every client
/// receives every ledger notification.
pub struct ClientRegistry {
    clients: DashMap<Uuid, mpsc::UnboundedSender<String>>,
}

impl ClientRegistry {
    /// Create a new client registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            clients: DashMap::new(),
        })
    }

    /// Register a new client.
    pub fn register(&self, tx: mpsc::UnboundedSender<String>) -> Uuid {
        let client_id = Uuid::new_v4();
        self.clients.insert(client_id, tx);
        client_id
    }

    /// Unregister a client.
    pub fn unregister(&self, client_id: Uuid) {
        self.clients.remove(&client_id);
    }

    /// Send a message to one client.
    pub fn send_to(&self, client_id: Uuid, message: &str) {
        if let Some(tx) = self.clients.get(&client_id) {
            let _ = tx.send(message.to_string());
        }
    }

    /// Broadcast a message to every connected client.
    pub fn broadcast_all(&self, message: &str) {
        for entry in self.clients.iter() {
            let _ = entry.value().send(message.to_string());
        }
    }

    /// Number of connected clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether any clients are connected.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
