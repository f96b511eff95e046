pub mod client_registry;
pub mod handler;

pub use client_registry::ClientRegistry;
pub use handler::ws_handler;
