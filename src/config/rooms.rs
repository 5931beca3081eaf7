/// Room configuration constants.
///
/// This module defines parameters for room codes and per-map player limits.
pub const ROOM_CODE_MIN: u32 = 1000; // Room codes are 4-digit decimal strings.

/// Upper bound (inclusive) for generated room codes.
pub const ROOM_CODE_MAX: u32 = 9999;

/// Minimum number of players required to start a game.
pub const MIN_PLAYERS: usize = 2;

/// Grid dimension of a small map.
pub const SMALL_MAP_SIZE: usize = 10;

/// Grid dimension of a medium map.
pub const MEDIUM_MAP_SIZE: usize = 15;

/// Grid dimension of a large map.
pub const LARGE_MAP_SIZE: usize = 20;

/// Maximum number of players on a small map.
pub const SMALL_MAX_PLAYERS: usize = 2;

/// Maximum number of players on a medium map.
pub const MEDIUM_MAX_PLAYERS: usize = 4;

/// Maximum number of players on a large map.
pub const LARGE_MAX_PLAYERS: usize = 6;
