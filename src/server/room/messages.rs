use actix::prelude::*;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::game::objects::ObjectKind;
use crate::game::player::{AttributeBonus, DiceChoice};
use crate::game::state::Game;
use crate::game::types::{BotProfile, Position};
use crate::server::room::session::RoomSession;

/// Client -> server events, `{"action": ..., "data": ...}` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", content = "data")]
pub enum ClientEvent {
    ToggleLock,
    KickPlayer { player_id: Uuid },
    AddVirtualPlayer { profile: BotProfile },
    StartGame,
    MovePlayer { x: usize, y: usize },
    InteractDoor { x: usize, y: usize },
    InitiateCombat { x: usize, y: usize },
    Attack,
    Evade,
    EndTurn,
    SelectObject { object: ObjectKind },
    ToggleDebug,
    Ping,
}

/// One line of the waiting-room roster.
#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub player_id: Uuid,
    pub name: String,
    pub avatar: String,
    pub is_admin: bool,
    pub is_virtual: bool,
}

// Server -> client events.
#[derive(Message, Debug, Clone, Serialize)]
#[rtype(result = "()")]
#[serde(tag = "action", content = "data")]
pub enum ServerEvent {
    RosterUpdate { players: Vec<RosterEntry>, locked: bool },
    GameStarted,
    Snapshot { game: Game },
    AccessibleTiles { tiles: Vec<Position> },
    TurnChanged { player_id: Uuid, transition_secs: u64 },
    TimerTick { remaining_secs: u64 },
    CombatStarted { attacker: Uuid, defender: Uuid },
    CombatAttack { attacker: Uuid, attack_roll: u32, defense_roll: u32, damage: u32 },
    CombatEvade { player_id: Uuid, success: bool, attempts_left: u32 },
    CombatEnded { winner: Option<Uuid>, loser: Option<Uuid>, escaped: bool },
    GameOver { winner: Uuid },
    Notify { message: String, is_error: bool },
    Redirect { route: String },
    Kicked { reason: String },
}

impl ServerEvent {
    pub fn notify(message: &str) -> Self {
        Self::Notify { message: message.to_string(), is_error: false }
    }

    pub fn error(message: &str) -> Self {
        Self::Notify { message: message.to_string(), is_error: true }
    }

    pub fn redirect_home() -> Self {
        Self::Redirect { route: "/home".to_string() }
    }
}

/// A participant's WebSocket session attached to the room.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub player_id: Uuid,
    pub name: String,
    pub avatar: String,
    pub bonus: AttributeBonus,
    pub dice: DiceChoice,
    pub addr: Addr<RoomSession>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub player_id: Uuid,
    /// The departing session. Ignored if another session already replaced it.
    pub addr: Addr<RoomSession>,
}

/// An inbound action from a connected participant.
#[derive(Message)]
#[rtype(result = "()")]
pub struct ClientCommand {
    pub player_id: Uuid,
    pub event: ClientEvent,
}
