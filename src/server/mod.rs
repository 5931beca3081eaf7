// src/server/mod.rs

//! Server layer root module.
//!
//! This module organizes the main backend server components, including:
//! - Application state management
//! - HTTP/WebSocket routing
//! - Room orchestration (waiting room, game room, stats room)
//! - Per-connection WebSocket sessions and error throttling

pub mod state;
pub mod router;
pub mod room;
pub mod throttle;
pub mod ws_error;
