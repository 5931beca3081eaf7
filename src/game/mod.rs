pub mod types;
pub mod objects;
pub mod map;
pub mod player;
pub mod pathfinding;
pub mod combat;
pub mod state;
pub mod virtual_player;

#[cfg(test)]
pub mod tests;
