/// Main configuration module.
///
/// Re-exports submodules for game and room configuration.
pub mod game;
pub mod rooms;
