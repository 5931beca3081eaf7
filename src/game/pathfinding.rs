//! Pathfinding and grid reachability.
//!
//! Pure functions over the tile grid: neighbor enumeration, weighted
//! shortest path, budget-bounded flood fill, and unweighted connectivity.
//! Other players' tiles are obstacles; the mover's own start tile is not.
//! All frontiers are ordered so equal-cost ties always resolve the same way.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use uuid::Uuid;

use crate::game::map::GameMap;
use crate::game::types::{Position, TileKind};

/// A search node: a tile annotated with its accumulated cost. Ordering by
/// (cost, y, x) gives the frontier a deterministic pop order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct SearchNode {
    cost: u32,
    y: usize,
    x: usize,
}

impl SearchNode {
    fn pos(self) -> Position {
        Position { x: self.x, y: self.y }
    }
}

/// A shortest path and its total movement cost. The tile list starts at the
/// first step (the start tile is omitted) and ends at the goal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub tiles: Vec<Position>,
    pub cost: u32,
}

/// The ≤4 orthogonally adjacent in-bounds cells, in fixed order
/// (up, down, left, right).
pub fn neighbors(map: &GameMap, pos: Position) -> Vec<Position> {
    let mut out = Vec::with_capacity(4);
    if pos.y > 0 {
        out.push(Position { x: pos.x, y: pos.y - 1 });
    }
    if pos.y + 1 < map.height() {
        out.push(Position { x: pos.x, y: pos.y + 1 });
    }
    if pos.x > 0 {
        out.push(Position { x: pos.x - 1, y: pos.y });
    }
    if pos.x + 1 < map.width() {
        out.push(Position { x: pos.x + 1, y: pos.y });
    }
    out
}

/// Cost of stepping onto `pos` for `mover`, or `None` when the tile is
/// impassable (wall, closed door) or occupied by another player.
fn enter_cost(map: &GameMap, pos: Position, mover: Uuid) -> Option<u32> {
    let cost = map.kind(pos).cost()?;
    match map.occupant(pos) {
        Some(occupant) if occupant != mover => None,
        _ => Some(cost),
    }
}

/// Minimum-cost path from `start` to `goal` with total cost ≤ `budget`, or
/// `None` if the goal is unreachable within the budget. Uniform-cost search
/// over the tile cost table; deterministic by frontier ordering.
pub fn shortest_path(
    map: &GameMap,
    start: Position,
    goal: Position,
    budget: u32,
    mover: Uuid,
) -> Option<Path> {
    if !map.in_bounds(start) || !map.in_bounds(goal) {
        return None;
    }
    if start == goal {
        return Some(Path { tiles: vec![], cost: 0 });
    }

    let mut frontier: BTreeSet<SearchNode> = BTreeSet::new();
    let mut best: BTreeMap<Position, u32> = BTreeMap::new();
    let mut came_from: BTreeMap<Position, Position> = BTreeMap::new();

    frontier.insert(SearchNode { cost: 0, y: start.y, x: start.x });
    best.insert(start, 0);

    while let Some(node) = frontier.pop_first() {
        let current = node.pos();
        if current == goal {
            return Some(Path { tiles: reconstruct(&came_from, start, goal), cost: node.cost });
        }
        if node.cost > *best.get(&current).unwrap_or(&u32::MAX) {
            continue;
        }
        for next in neighbors(map, current) {
            let Some(step) = enter_cost(map, next, mover) else {
                continue;
            };
            let total = node.cost + step;
            if total > budget {
                continue;
            }
            if total < *best.get(&next).unwrap_or(&u32::MAX) {
                best.insert(next, total);
                came_from.insert(next, current);
                frontier.insert(SearchNode { cost: total, y: next.y, x: next.x });
            }
        }
    }
    None
}

/// All positions reachable from `start` with cumulative cost ≤ `budget`,
/// including the start tile itself. Used to highlight legal moves.
pub fn reachable_tiles(
    map: &GameMap,
    start: Position,
    budget: u32,
    mover: Uuid,
) -> BTreeSet<Position> {
    let mut reachable = BTreeSet::new();
    if !map.in_bounds(start) {
        return reachable;
    }

    let mut frontier: BTreeSet<SearchNode> = BTreeSet::new();
    let mut best: BTreeMap<Position, u32> = BTreeMap::new();
    frontier.insert(SearchNode { cost: 0, y: start.y, x: start.x });
    best.insert(start, 0);

    while let Some(node) = frontier.pop_first() {
        let current = node.pos();
        if node.cost > *best.get(&current).unwrap_or(&u32::MAX) {
            continue;
        }
        reachable.insert(current);
        for next in neighbors(map, current) {
            let Some(step) = enter_cost(map, next, mover) else {
                continue;
            };
            let total = node.cost + step;
            if total > budget {
                continue;
            }
            if total < *best.get(&next).unwrap_or(&u32::MAX) {
                best.insert(next, total);
                frontier.insert(SearchNode { cost: total, y: next.y, x: next.x });
            }
        }
    }
    reachable
}

/// Unweighted reachability from `start`, ignoring movement cost and
/// occupancy. Doors count as passable in either state. Supports map
/// accessibility validation only.
pub fn bfs_connectivity(map: &GameMap, start: Position) -> BTreeSet<Position> {
    let mut visited = BTreeSet::new();
    if !map.in_bounds(start) || map.kind(start) == TileKind::Wall {
        return visited;
    }
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);
    while let Some(current) = queue.pop_front() {
        for next in neighbors(map, current) {
            if map.kind(next) != TileKind::Wall && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    visited
}

fn reconstruct(
    came_from: &BTreeMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut tiles = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        tiles.push(prev);
        current = prev;
    }
    tiles.reverse();
    tiles
}
