//! Main entry point for the backend server.
//!
//! Initializes the actor system, configures application state, and launches
//! the HTTP server with the room WebSocket endpoint.

use actix::Actor;
use actix_web::{web, App, HttpServer};

use crate::maps::MapStore;
use crate::server::room::registry::RoomRegistry;

pub mod config;
mod game;
mod maps;
mod server;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger from environment variable (default to info level).
    env_logger::init();

    // Start the room registry actor (owns room lifecycle and lookup).
    let registry = RoomRegistry::new(MapStore::with_builtins()).start();

    // Shared application state for HTTP/WebSocket handlers.
    let state = web::Data::new(server::state::AppState::new(registry));

    // Start the HTTP server with the room endpoints.
    HttpServer::new(move || {
        App::new()
            .wrap(
                actix_web::middleware::DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", "*"))
            )
            .app_data(state.clone())
            .configure(crate::server::router::config)
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
