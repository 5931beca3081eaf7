//! Room registry actor.
//!
//! Maps room codes to `Room` actor addresses. This is the explicit registry
//! every handler reaches through; there is no global room state. Entries are
//! inserted on creation and removed when a room tears itself down.

use actix::prelude::*;
use log::info;
use rand::Rng;
use std::collections::HashMap;

use crate::config::rooms::{ROOM_CODE_MIN, ROOM_CODE_MAX};
use crate::maps::MapStore;
use crate::server::room::room::Room;

pub struct RoomRegistry {
    rooms: HashMap<String, Addr<Room>>,
    store: MapStore,
}

impl RoomRegistry {
    pub fn new(store: MapStore) -> Self {
        Self {
            rooms: HashMap::new(),
            store,
        }
    }

    /// Draw a 4-digit code not currently in use.
    fn free_code(&self) -> String {
        let mut rng = rand::rng();
        loop {
            let code = rng.random_range(ROOM_CODE_MIN..=ROOM_CODE_MAX).to_string();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

impl Actor for RoomRegistry {
    type Context = Context<Self>;
}

/// Message: create a room for the given map. The map is fetched and
/// validated here, before the room (and later its game model) exists.
#[derive(Message)]
#[rtype(result = "Result<String, String>")]
pub struct CreateRoom {
    pub map_id: String,
}

impl Handler<CreateRoom> for RoomRegistry {
    type Result = Result<String, String>;

    fn handle(&mut self, msg: CreateRoom, ctx: &mut Context<Self>) -> Self::Result {
        let descriptor = self
            .store
            .get(&msg.map_id)
            .ok_or_else(|| format!("unknown map '{}'", msg.map_id))?;
        let code = self.free_code();
        let room = Room::new(code.clone(), descriptor, ctx.address()).start();
        self.rooms.insert(code.clone(), room);
        info!("[Registry] room {} created on map {}", code, msg.map_id);
        Ok(code)
    }
}

/// Message: resolve a room code to its actor address.
#[derive(Message)]
#[rtype(result = "Result<Addr<Room>, String>")]
pub struct GetRoom {
    pub code: String,
}

impl Handler<GetRoom> for RoomRegistry {
    type Result = Result<Addr<Room>, String>;

    fn handle(&mut self, msg: GetRoom, _: &mut Context<Self>) -> Self::Result {
        self.rooms
            .get(&msg.code)
            .cloned()
            .ok_or_else(|| "Room not found".to_string())
    }
}

/// Message: a room finished tearing down; forget it.
#[derive(Message)]
#[rtype(result = "()")]
pub struct RoomClosed {
    pub code: String,
}

impl Handler<RoomClosed> for RoomRegistry {
    type Result = ();

    fn handle(&mut self, msg: RoomClosed, _: &mut Context<Self>) -> Self::Result {
        self.rooms.remove(&msg.code);
        info!("[Registry] room {} closed", msg.code);
    }
}
