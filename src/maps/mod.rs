//! Validated-map boundary.
//!
//! The game core consumes `MapDescriptor`s produced by the external map
//! management service; it never writes them back. This store keeps the
//! validated descriptors in memory and is consulted exactly once per room,
//! at creation, before the game model is constructed. Descriptors failing
//! the accessibility check are refused at insertion.

use log::{info, warn};
use std::collections::HashMap;

use crate::game::map::{GameMap, MapDescriptor};
use crate::game::pathfinding;
use crate::game::types::TileKind;

pub struct MapStore {
    maps: HashMap<String, MapDescriptor>,
}

impl MapStore {
    /// A store seeded with the built-in maps.
    pub fn with_builtins() -> Self {
        let mut store = Self { maps: HashMap::new() };
        let builtins: Vec<MapDescriptor> = serde_json::from_str(BUILTIN_MAPS)
            .expect("built-in map descriptors are well-formed");
        for desc in builtins {
            if let Err(reason) = store.insert(desc) {
                warn!("[MapStore] built-in map rejected: {reason}");
            }
        }
        store
    }

    pub fn get(&self, id: &str) -> Option<MapDescriptor> {
        self.maps.get(id).cloned()
    }

    /// Accept a descriptor after re-checking the invariants the game core
    /// relies on: parsable grid, enough spawn points for the map size, and
    /// every non-wall tile reachable from the first spawn.
    pub fn insert(&mut self, desc: MapDescriptor) -> Result<(), String> {
        let map = GameMap::from_descriptor(&desc).map_err(|e| e.to_string())?;
        if desc.spawns.len() < desc.size.max_players() {
            return Err(format!(
                "map {} has {} spawn points, needs {}",
                desc.id,
                desc.spawns.len(),
                desc.size.max_players()
            ));
        }
        let reachable = pathfinding::bfs_connectivity(&map, desc.spawns[0]);
        let accessible_tiles = (0..map.height())
            .flat_map(|y| (0..map.width()).map(move |x| crate::game::types::Position::new(x, y)))
            .filter(|p| map.kind(*p) != TileKind::Wall)
            .count();
        if reachable.len() != accessible_tiles {
            return Err(format!(
                "map {} has unreachable tiles ({} of {} accessible)",
                desc.id,
                reachable.len(),
                accessible_tiles
            ));
        }
        info!("[MapStore] map {} ({:?}, {:?}) available", desc.id, desc.size, desc.mode);
        self.maps.insert(desc.id.clone(), desc);
        Ok(())
    }
}

const BUILTIN_MAPS: &str = r#"[
  {
    "id": "crossroads",
    "name": "Crossroads",
    "size": "small",
    "mode": "classical",
    "rows": [
      "..........",
      ".....d....",
      "..##.#....",
      "..#..#..w.",
      ".....#.ww.",
      "..i.......",
      "..i....#..",
      ".......#..",
      "....ww.#..",
      ".........."
    ],
    "spawns": [{"x": 1, "y": 1}, {"x": 8, "y": 8}],
    "objects": [
      {"kind": "blade", "at": {"x": 5, "y": 5}},
      {"kind": "talisman", "at": {"x": 2, "y": 9}},
      {"kind": "boots", "at": {"x": 8, "y": 1}},
      {"kind": "bird", "at": {"x": 1, "y": 8}}
    ]
  },
  {
    "id": "twin-banners",
    "name": "Twin Banners",
    "size": "small",
    "mode": "ctf",
    "rows": [
      "..........",
      "...#..#...",
      ".#......#.",
      "...i..i...",
      "o........o",
      "....ww....",
      "...i..i...",
      ".#......#.",
      "...#..#...",
      ".........."
    ],
    "spawns": [{"x": 0, "y": 0}, {"x": 9, "y": 9}],
    "objects": [
      {"kind": "flag", "at": {"x": 4, "y": 4}},
      {"kind": "boots", "at": {"x": 2, "y": 2}},
      {"kind": "bird", "at": {"x": 7, "y": 7}}
    ]
  }
]"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::map::MapSize;
    use crate::game::types::{GameMode, Position};

    #[test]
    fn builtins_load_and_resolve() {
        let store = MapStore::with_builtins();
        let classical = store.get("crossroads").unwrap();
        assert_eq!(classical.size, MapSize::Small);
        assert_eq!(classical.mode, GameMode::Classical);
        let ctf = store.get("twin-banners").unwrap();
        assert_eq!(ctf.mode, GameMode::Ctf);
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn store_refuses_unreachable_maps() {
        let mut store = MapStore::with_builtins();
        let mut desc = store.get("crossroads").unwrap();
        desc.id = "sealed".to_string();
        // Seal the bottom row off with a full wall line.
        desc.rows[8] = "##########".to_string();
        desc.spawns = vec![Position::new(1, 1), Position::new(3, 0)];
        desc.objects = vec![];
        assert!(store.insert(desc).is_err());
        assert!(store.get("sealed").is_none());
    }

    #[test]
    fn store_requires_enough_spawns() {
        let mut store = MapStore::with_builtins();
        let mut desc = store.get("crossroads").unwrap();
        desc.id = "one-spawn".to_string();
        desc.spawns = vec![Position::new(1, 1)];
        assert!(store.insert(desc).is_err());
    }
}
