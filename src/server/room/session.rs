//! Per-connection WebSocket session.
//!
//! One actor per connected participant. Registers with the room on start,
//! unregisters on stop, parses inbound JSON into `ClientEvent`s, and relays
//! outbound `ServerEvent`s. Error notifications pass through the per-session
//! throttle so a misbehaving client cannot echo-flood itself.

use actix::{Actor, ActorContext, Addr, AsyncContext, Handler, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use std::borrow::Cow;
use uuid::Uuid;

use crate::game::player::{AttributeBonus, DiceChoice};
use crate::server::room::messages::{ClientCommand, ClientEvent, Connect, Disconnect, ServerEvent};
use crate::server::room::registry::GetRoom;
use crate::server::room::room::Room;
use crate::server::throttle::ErrorThrottle;
use crate::server::ws_error::{ws_invalid_event, ws_serialize_failure};

pub struct RoomSession {
    pub player_id: Uuid,
    pub code: String,
    pub name: String,
    pub avatar: String,
    pub bonus: AttributeBonus,
    pub dice: DiceChoice,
    pub room: Addr<Room>,
    throttle: ErrorThrottle,
}

impl Actor for RoomSession {
    type Context = ws::WebsocketContext<Self>;

    /// Called when the session starts. Registers the participant in the room.
    fn started(&mut self, ctx: &mut Self::Context) {
        log::debug!("[Session] {} connecting to room {}", self.player_id, self.code);
        self.room.do_send(Connect {
            player_id: self.player_id,
            name: self.name.clone(),
            avatar: self.avatar.clone(),
            bonus: self.bonus,
            dice: self.dice,
            addr: ctx.address(),
        });
    }

    /// Called when the session stops. Removes the participant from the room.
    fn stopped(&mut self, ctx: &mut Self::Context) {
        self.room.do_send(Disconnect {
            player_id: self.player_id,
            addr: ctx.address(),
        });
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for RoomSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                let event: ClientEvent = match serde_json::from_str(&text) {
                    Ok(event) => event,
                    Err(_) => {
                        if self.throttle.should_send("invalid event") {
                            ctx.text(ws_invalid_event());
                        }
                        return;
                    }
                };
                self.throttle.reset();
                self.room.do_send(ClientCommand { player_id: self.player_id, event });
            }
            Ok(ws::Message::Ping(payload)) => ctx.pong(&payload),
            Ok(ws::Message::Close(_)) => ctx.stop(),
            _ => (),
        }
    }
}

impl Handler<ServerEvent> for RoomSession {
    type Result = ();

    fn handle(&mut self, msg: ServerEvent, ctx: &mut Self::Context) -> Self::Result {
        if let ServerEvent::Notify { message, is_error: true } = &msg {
            if !self.throttle.should_send(message) {
                return;
            }
        }
        let kicked = matches!(msg, ServerEvent::Kicked { .. });
        match serde_json::to_string(&msg) {
            Ok(text) => ctx.text(text),
            Err(e) => {
                log::error!("[Session] failed to serialize server event: {e}");
                ctx.text(ws_serialize_failure());
            }
        }
        if kicked {
            ctx.close(Some(ws::CloseReason {
                code: ws::CloseCode::Policy,
                description: Some("Removed from room".into()),
            }));
            ctx.stop();
        }
    }
}

fn query_param<'a>(req: &'a HttpRequest, key: &str) -> Option<&'a str> {
    req.query_string().split('&').find_map(|kv| {
        let mut split = kv.split('=');
        match (split.next(), split.next()) {
            (Some(k), Some(v)) if k == key => Some(v),
            _ => None,
        }
    })
}

/// WebSocket endpoint for a room.
///
/// Query parameters: `name` (display name, URL-encoded), `avatar`,
/// `bonus` (`health`|`speed`), `dice` (`attack`|`defense`), and `player_id`
/// when reconnecting to a running game.
pub async fn ws_room(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<crate::server::state::AppState>,
) -> Result<HttpResponse, Error> {
    let code = req.match_info().get("code").unwrap_or("").to_string();

    let player_id = query_param(&req, "player_id")
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .unwrap_or_else(Uuid::new_v4);

    let mut name = query_param(&req, "name")
        .map(|raw| {
            urlencoding::decode(raw)
                .unwrap_or_else(|_| Cow::Borrowed(""))
                .into_owned()
        })
        .unwrap_or_default();
    if name.is_empty() {
        name = format!("Player_{}", &player_id.to_string()[..6]);
    }
    let avatar = query_param(&req, "avatar").unwrap_or("fox").to_string();
    let bonus = match query_param(&req, "bonus") {
        Some("speed") => AttributeBonus::Speed,
        _ => AttributeBonus::Health,
    };
    let dice = match query_param(&req, "dice") {
        Some("defense") => DiceChoice::Defense,
        _ => DiceChoice::Attack,
    };

    let room = data
        .registry
        .send(GetRoom { code: code.clone() })
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?
        .map_err(actix_web::error::ErrorNotFound)?;

    ws::start(
        RoomSession {
            player_id,
            code,
            name,
            avatar,
            bonus,
            dice,
            room,
            throttle: ErrorThrottle::new(),
        },
        &req,
        stream,
    )
}
