//! Paperdesk - simulated brokerage ledger server for a retail trading
//! dashboard.
//!
//! The core is a single-account bookkeeping engine ([`services::LedgerService`])
//! that tracks cash, positions, and fills under repeated
//! buy/sell/mark-to-market operations, persists itself to SQLite on every
//! mutation, and broadcasts payload-free change notifications so dashboard
//! consumers know when to re-fetch the snapshot.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod types;
pub mod websocket;

use std::sync::Arc;

// Re-export commonly used types
pub use config::Config;
pub use services::{AccountStore, FeeSchedule, LedgerError, LedgerEvent, LedgerService};
pub use types::*;
pub use websocket::ClientRegistry;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ledger: Arc<LedgerService>,
    pub clients: Arc<ClientRegistry>,
}
