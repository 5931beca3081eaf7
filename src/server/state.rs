// src/server/state.rs

//! Application state for the backend server.
//!
//! Holds the room registry actor address. Used to share state between
//! HTTP/WebSocket handlers and the actor system.

use actix::Addr;
use crate::server::room::registry::RoomRegistry;

/// Shared application state, injected into HTTP/WebSocket handlers.
pub struct AppState {
    /// Address of the room registry actor (room lifecycle and lookup).
    pub registry: Addr<RoomRegistry>,
}

impl AppState {
    /// Create a new AppState with the given registry address.
    pub fn new(registry: Addr<RoomRegistry>) -> Self {
        AppState { registry }
    }
}
