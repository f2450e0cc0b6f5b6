//! Server state shared across handlers.

use serde::Deserialize;

use crate::registry::RoomRegistry;

/// Query parameters for the WebSocket join handoff
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Caller-supplied player display name
    pub name: String,
}

/// Shared application state
pub struct AppState {
    /// Registry of live rooms, keyed by game id
    pub registry: RoomRegistry,
    /// Address the server is reachable on, used for lobby connection info
    pub bind_addr: String,
}
