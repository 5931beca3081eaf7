//! Game map: the tile grid and its occupancy.
//!
//! A map is built once from a validated descriptor and is immutable for the
//! rest of the match except for door state and tile occupancy. Exactly one
//! player may occupy a tile; a player and an object may co-occupy.

use serde::{Serialize, Deserialize};
use std::collections::{BTreeSet, VecDeque};
use thiserror::Error;
use uuid::Uuid;

use crate::config::rooms::{
    SMALL_MAP_SIZE, MEDIUM_MAP_SIZE, LARGE_MAP_SIZE,
    SMALL_MAX_PLAYERS, MEDIUM_MAX_PLAYERS, LARGE_MAX_PLAYERS,
};
use crate::game::objects::ObjectKind;
use crate::game::types::{GameMode, Position, TileKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapSize {
    Small,
    Medium,
    Large,
}

impl MapSize {
    pub fn dimension(self) -> usize {
        match self {
            MapSize::Small => SMALL_MAP_SIZE,
            MapSize::Medium => MEDIUM_MAP_SIZE,
            MapSize::Large => LARGE_MAP_SIZE,
        }
    }

    pub fn max_players(self) -> usize {
        match self {
            MapSize::Small => SMALL_MAX_PLAYERS,
            MapSize::Medium => MEDIUM_MAX_PLAYERS,
            MapSize::Large => LARGE_MAX_PLAYERS,
        }
    }
}

/// An object placement in a map descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectPlacement {
    pub kind: ObjectKind,
    pub at: Position,
}

/// A validated map as delivered by the map management boundary. The game
/// core only consumes these; it never writes them back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapDescriptor {
    pub id: String,
    pub name: String,
    pub size: MapSize,
    pub mode: GameMode,
    /// One string per row; one character per tile.
    /// `.` base, `w` water, `i` ice, `#` wall, `o` open door, `d` closed door.
    pub rows: Vec<String>,
    pub spawns: Vec<Position>,
    pub objects: Vec<ObjectPlacement>,
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("unknown tile character '{0}'")]
    UnknownTileChar(char),
    #[error("row {row} has {got} tiles, expected {expected}")]
    RaggedRow { row: usize, got: usize, expected: usize },
    #[error("map is {got} rows, expected {expected} for its size")]
    BadDimensions { got: usize, expected: usize },
    #[error("spawn point {0:?} is out of bounds or not walkable")]
    BadSpawn(Position),
    #[error("object at {0:?} is out of bounds or not walkable")]
    BadObjectPlacement(Position),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    pub player: Option<Uuid>,
    pub object: Option<ObjectKind>,
}

impl Tile {
    fn new(kind: TileKind) -> Self {
        Self { kind, player: None, object: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMap {
    tiles: Vec<Vec<Tile>>,
}

impl GameMap {
    /// Build the in-memory grid from a validated descriptor.
    pub fn from_descriptor(desc: &MapDescriptor) -> Result<Self, MapError> {
        let expected = desc.size.dimension();
        if desc.rows.len() != expected {
            return Err(MapError::BadDimensions { got: desc.rows.len(), expected });
        }

        let mut tiles = Vec::with_capacity(desc.rows.len());
        for (y, row) in desc.rows.iter().enumerate() {
            let mut parsed = Vec::with_capacity(expected);
            for c in row.chars() {
                let kind = match c {
                    '.' => TileKind::Base,
                    'w' => TileKind::Water,
                    'i' => TileKind::Ice,
                    '#' => TileKind::Wall,
                    'o' => TileKind::DoorOpen,
                    'd' => TileKind::DoorClosed,
                    other => return Err(MapError::UnknownTileChar(other)),
                };
                parsed.push(Tile::new(kind));
            }
            if parsed.len() != expected {
                return Err(MapError::RaggedRow { row: y, got: parsed.len(), expected });
            }
            tiles.push(parsed);
        }

        let mut map = Self { tiles };
        for spawn in &desc.spawns {
            if !map.in_bounds(*spawn) || !map.kind(*spawn).is_walkable() {
                return Err(MapError::BadSpawn(*spawn));
            }
        }
        for placement in &desc.objects {
            if !map.in_bounds(placement.at) || !map.kind(placement.at).is_walkable() {
                return Err(MapError::BadObjectPlacement(placement.at));
            }
            map.tiles[placement.at.y][placement.at.x].object = Some(placement.kind);
        }
        Ok(map)
    }

    pub fn width(&self) -> usize {
        self.tiles.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.tiles.len()
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.y < self.height() && pos.x < self.width()
    }

    pub fn tile(&self, pos: Position) -> &Tile {
        &self.tiles[pos.y][pos.x]
    }

    pub fn kind(&self, pos: Position) -> TileKind {
        self.tiles[pos.y][pos.x].kind
    }

    pub fn occupant(&self, pos: Position) -> Option<Uuid> {
        self.tiles[pos.y][pos.x].player
    }

    pub fn set_occupant(&mut self, pos: Position, player: Option<Uuid>) {
        self.tiles[pos.y][pos.x].player = player;
    }

    pub fn object(&self, pos: Position) -> Option<ObjectKind> {
        self.tiles[pos.y][pos.x].object
    }

    pub fn take_object(&mut self, pos: Position) -> Option<ObjectKind> {
        self.tiles[pos.y][pos.x].object.take()
    }

    pub fn place_object(&mut self, pos: Position, kind: ObjectKind) {
        self.tiles[pos.y][pos.x].object = Some(kind);
    }

    /// Toggle a door tile. Returns the new open state, or `None` if the tile
    /// is not a door.
    pub fn toggle_door(&mut self, pos: Position) -> Option<bool> {
        let tile = &mut self.tiles[pos.y][pos.x];
        match tile.kind {
            TileKind::DoorOpen => {
                tile.kind = TileKind::DoorClosed;
                Some(false)
            }
            TileKind::DoorClosed => {
                tile.kind = TileKind::DoorOpen;
                Some(true)
            }
            _ => None,
        }
    }

    /// A tile a player can stand on right now: walkable kind and unoccupied.
    pub fn is_free(&self, pos: Position) -> bool {
        self.in_bounds(pos) && self.kind(pos).is_walkable() && self.occupant(pos).is_none()
    }

    pub fn door_count(&self) -> usize {
        self.tiles.iter().flatten().filter(|t| t.kind.is_door()).count()
    }

    pub fn walkable_tile_count(&self) -> usize {
        self.tiles
            .iter()
            .flatten()
            .filter(|t| t.kind.is_walkable() || t.kind == TileKind::DoorClosed)
            .count()
    }

    /// Nearest free tile to `origin` by breadth-first distance, falling back
    /// to `fallback` when nothing around `origin` is free. Used to relocate a
    /// combat loser.
    pub fn nearest_free_tile(&self, origin: Position, fallback: Position) -> Position {
        if self.is_free(origin) {
            return origin;
        }
        let mut visited: BTreeSet<Position> = BTreeSet::new();
        let mut queue = VecDeque::new();
        visited.insert(origin);
        queue.push_back(origin);
        while let Some(current) = queue.pop_front() {
            for neighbor in crate::game::pathfinding::neighbors(self, current) {
                if !visited.insert(neighbor) {
                    continue;
                }
                if self.is_free(neighbor) {
                    return neighbor;
                }
                if self.kind(neighbor).is_walkable() {
                    queue.push_back(neighbor);
                }
            }
        }
        fallback
    }
}
