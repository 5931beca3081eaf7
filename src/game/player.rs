//! Player entity: identity, attributes, stats, inventory, and status flags.

use serde::{Serialize, Deserialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::config::game::{ACTIONS_PER_TURN, ATTRIBUTE_BONUS, BASE_ATTRIBUTE};
use crate::game::objects::{self, ObjectKind};
use crate::game::types::{Attributes, BotProfile, DiceAttribute, Die, PlayerFlag, Position};

/// Which attribute receives the join-time bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeBonus {
    Health,
    Speed,
}

/// Which combat attribute gets the six-sided die; the other gets the D4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiceChoice {
    Attack,
    Defense,
}

pub fn build_attributes(bonus: AttributeBonus, dice: DiceChoice) -> Attributes {
    let health = match bonus {
        AttributeBonus::Health => BASE_ATTRIBUTE + ATTRIBUTE_BONUS,
        AttributeBonus::Speed => BASE_ATTRIBUTE,
    };
    let speed = match bonus {
        AttributeBonus::Speed => BASE_ATTRIBUTE + ATTRIBUTE_BONUS,
        AttributeBonus::Health => BASE_ATTRIBUTE,
    };
    let (attack_die, defense_die) = match dice {
        DiceChoice::Attack => (Die::D6, Die::D4),
        DiceChoice::Defense => (Die::D4, Die::D6),
    };
    Attributes {
        max_health: health,
        health,
        speed,
        attack: DiceAttribute { value: BASE_ATTRIBUTE, die: attack_die },
        defense: DiceAttribute { value: BASE_ATTRIBUTE, die: defense_die },
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    pub victories: u32,
    pub defeats: u32,
    pub evasions: u32,
    pub combats: u32,
    pub damage_dealt: u32,
    pub damage_taken: u32,
    pub objects_picked_up: u32,
    pub tiles_visited_pct: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
    pub attributes: Attributes,
    pub stats: PlayerStats,
    pub inventory: Vec<ObjectKind>,
    pub flags: BTreeSet<PlayerFlag>,
    pub moves_left: u32,
    pub actions_left: u32,
    pub pos: Position,
    pub spawn_point: Option<Position>,
    /// Evasion attempts used in the current combat. Combat-scoped.
    pub evasion_attempts: u32,
    /// Decision profile when this player is bot-controlled.
    pub bot_profile: Option<BotProfile>,
    #[serde(skip)]
    pub visited: BTreeSet<Position>,
}

impl Player {
    pub fn new(id: Uuid, name: &str, avatar: &str, attributes: Attributes) -> Self {
        Self {
            id,
            name: name.to_string(),
            avatar: avatar.to_string(),
            attributes,
            stats: PlayerStats::default(),
            inventory: Vec::new(),
            flags: BTreeSet::new(),
            moves_left: attributes.speed,
            actions_left: ACTIONS_PER_TURN,
            pos: Position::new(0, 0),
            spawn_point: None,
            evasion_attempts: 0,
            bot_profile: None,
            visited: BTreeSet::new(),
        }
    }

    /// A virtual player. Aggressive bots favor speed and the attack die,
    /// defensive bots favor health and the defense die.
    pub fn virtual_player(id: Uuid, name: &str, profile: BotProfile) -> Self {
        let attributes = match profile {
            BotProfile::Aggressive => build_attributes(AttributeBonus::Speed, DiceChoice::Attack),
            BotProfile::Defensive => build_attributes(AttributeBonus::Health, DiceChoice::Defense),
        };
        let mut player = Self::new(id, name, "robot", attributes);
        player.flags.insert(PlayerFlag::Virtual);
        player.bot_profile = Some(profile);
        player
    }

    pub fn has_flag(&self, flag: PlayerFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn set_flag(&mut self, flag: PlayerFlag) {
        self.flags.insert(flag);
    }

    pub fn clear_flag(&mut self, flag: PlayerFlag) {
        self.flags.remove(&flag);
    }

    pub fn is_connected(&self) -> bool {
        !self.has_flag(PlayerFlag::Disconnected)
    }

    pub fn is_virtual(&self) -> bool {
        self.has_flag(PlayerFlag::Virtual)
    }

    pub fn team(&self) -> Option<PlayerFlag> {
        if self.has_flag(PlayerFlag::RedTeam) {
            Some(PlayerFlag::RedTeam)
        } else if self.has_flag(PlayerFlag::BlueTeam) {
            Some(PlayerFlag::BlueTeam)
        } else {
            None
        }
    }

    pub fn has_object(&self, kind: ObjectKind) -> bool {
        self.inventory.contains(&kind)
    }

    /// Add an object to the inventory and apply its pickup bonus. The caller
    /// is responsible for the inventory bound.
    pub fn pick_up(&mut self, kind: ObjectKind) {
        objects::apply_pickup_bonus(self, kind);
        self.inventory.push(kind);
        self.stats.objects_picked_up += 1;
    }

    /// Remove an object from the inventory, reverting its pickup bonus.
    /// Returns false if the player does not hold it.
    pub fn drop_object(&mut self, kind: ObjectKind) -> bool {
        match self.inventory.iter().position(|k| *k == kind) {
            Some(idx) => {
                self.inventory.remove(idx);
                objects::remove_pickup_bonus(self, kind);
                true
            }
            None => false,
        }
    }

    /// Reset the per-turn budgets at the start of this player's turn.
    pub fn reset_turn_budget(&mut self) {
        self.moves_left = self.attributes.speed;
        self.actions_left = ACTIONS_PER_TURN;
    }

    /// Record a visited tile and refresh the visited percentage against the
    /// map's walkable tile count.
    pub fn record_visit(&mut self, pos: Position, walkable_tiles: usize) {
        self.visited.insert(pos);
        if walkable_tiles > 0 {
            self.stats.tiles_visited_pct =
                self.visited.len() as f32 / walkable_tiles as f32 * 100.0;
        }
    }
}
