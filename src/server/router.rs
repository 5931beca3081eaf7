//! HTTP and WebSocket routing configuration.
//!
//! Room creation happens over HTTP; everything afterwards flows through the
//! room's WebSocket endpoint, handled by a dedicated session actor.

use actix_web::{web, HttpResponse, http::StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::server::room::registry::CreateRoom;
use crate::server::room::session::ws_room;
use crate::server::state::AppState;
use crate::server::ws_error::http_error_response;

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub map_id: String,
}

/// `POST /api/rooms`: create a room for a map, returning its code.
async fn create_room(
    body: web::Json<CreateRoomRequest>,
    data: web::Data<AppState>,
) -> HttpResponse {
    match data.registry.send(CreateRoom { map_id: body.map_id.clone() }).await {
        Ok(Ok(code)) => HttpResponse::Created().json(json!({ "code": code })),
        Ok(Err(reason)) => {
            http_error_response("UNKNOWN_MAP", &reason, StatusCode::NOT_FOUND)
        }
        Err(e) => http_error_response(
            "REGISTRY_UNAVAILABLE",
            &e.to_string(),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    }
}

/// Configure the application's HTTP/WebSocket routes.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/rooms")
            .route(web::post().to(create_room))
    )
    .service(
        web::resource("/ws/room/{code}")
            .to(ws_room)
    );
}
