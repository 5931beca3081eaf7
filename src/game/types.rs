use serde::{Serialize, Deserialize};

use crate::config::game::ICE_DICE_PENALTY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Orthogonal distance between two positions.
    pub fn manhattan(self, other: Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// True if the positions are orthogonally adjacent (distance 1).
    pub fn is_adjacent(self, other: Position) -> bool {
        self.manhattan(other) == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Base,
    Water,
    Ice,
    Wall,
    DoorOpen,
    DoorClosed,
}

impl TileKind {
    /// Movement cost of entering a tile of this kind, or `None` if the tile
    /// cannot be entered at all.
    pub fn cost(self) -> Option<u32> {
        match self {
            TileKind::Ice => Some(0),
            TileKind::Base | TileKind::DoorOpen => Some(1),
            TileKind::Water => Some(2),
            TileKind::Wall | TileKind::DoorClosed => None,
        }
    }

    pub fn is_door(self) -> bool {
        matches!(self, TileKind::DoorOpen | TileKind::DoorClosed)
    }

    pub fn is_walkable(self) -> bool {
        self.cost().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Classical,
    Ctf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Die {
    D4,
    D6,
}

impl Die {
    pub fn sides(self) -> u32 {
        match self {
            Die::D4 => 4,
            Die::D6 => 6,
        }
    }

    pub fn roll(self, rng: &mut impl rand::Rng) -> u32 {
        rng.random_range(1..=self.sides())
    }
}

/// An attribute backed by a die, such as attack or defense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceAttribute {
    pub value: u32,
    pub die: Die,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub max_health: u32,
    pub health: u32,
    pub speed: u32,
    pub attack: DiceAttribute,
    pub defense: DiceAttribute,
}

impl Attributes {
    /// Attack roll: attribute value plus die, minus the ice penalty when the
    /// attacker stands on ice.
    pub fn attack_roll(&self, on_ice: bool, rng: &mut impl rand::Rng) -> u32 {
        let penalty = if on_ice { ICE_DICE_PENALTY } else { 0 };
        (self.attack.value + self.attack.die.roll(rng)).saturating_sub(penalty)
    }

    /// Defense roll, with the same ice penalty rule.
    pub fn defense_roll(&self, on_ice: bool, rng: &mut impl rand::Rng) -> u32 {
        let penalty = if on_ice { ICE_DICE_PENALTY } else { 0 };
        (self.defense.value + self.defense.die.roll(rng)).saturating_sub(penalty)
    }
}

/// Status flags carried by a player. Multi-valued: a player can be
/// simultaneously on ice and in combat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerFlag {
    Admin,
    RedTeam,
    BlueTeam,
    ActiveTurn,
    InCombat,
    OnIce,
    Disconnected,
    DeadInCombat,
    Virtual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    WaitingForTurn,
    PlayerActing,
    Moving,
    DoorInteraction,
    Combat,
    TurnEnding,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatTurn {
    Attacker,
    Defender,
}

/// Decision profile of a virtual player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotProfile {
    Aggressive,
    Defensive,
}
