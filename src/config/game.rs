/// Game configuration constants.
///
/// This module defines the main gameplay parameters such as turn duration,
/// combat pacing, dice defaults, and the item/evasion limits.
pub const TURN_DURATION: u64 = 30; // Duration of a turn in seconds.

/// Duration (in seconds) of a combat turn when the combatant can still evade.
pub const COMBAT_TURN_DURATION: u64 = 5;

/// Duration (in seconds) of a combat turn once the combatant has no evasion
/// attempts left.
pub const COMBAT_TURN_DURATION_NO_EVASION: u64 = 3;

/// Wall-clock delay (in seconds) between a turn or combat ending and the next
/// actionable turn. State is still broadcast immediately; only the next turn
/// start is deferred.
pub const TRANSITION_DELAY: u64 = 3;

/// Delay (in seconds) before a virtual player takes its next action.
pub const BOT_THINK_DELAY: u64 = 1;

/// Probability that an evasion attempt succeeds, independent of attributes.
pub const EVASION_SUCCESS_RATE: f64 = 0.4;

/// Maximum number of evasion attempts per player per combat.
pub const MAX_EVASION_ATTEMPTS: u32 = 2;

/// Maximum number of objects a player can hold.
pub const MAX_INVENTORY: usize = 2;

/// Combat victories required to win a Classical mode game.
pub const VICTORIES_TO_WIN: u32 = 3;

/// Base value for every attribute before the player's chosen bonus.
pub const BASE_ATTRIBUTE: u32 = 4;

/// Bonus added to the attribute (health or speed) picked at join time.
pub const ATTRIBUTE_BONUS: u32 = 2;

/// Dice penalty applied to attack and defense rolls while standing on ice.
pub const ICE_DICE_PENALTY: u32 = 2;

/// When true, landing on ice forces the player to keep sliding in the same
/// direction until a non-ice or blocked tile stops them. When false, ice
/// only costs zero movement.
pub const ICE_FORCED_SLIDE: bool = false;

/// Defender health at or below which the Blade's instant win triggers.
pub const BLADE_EXECUTION_THRESHOLD: u32 = 2;

/// Speed bonus granted while holding the Boots object.
pub const BOOTS_SPEED_BONUS: u32 = 2;

/// Actions (door toggles or combat initiations) allowed per turn.
pub const ACTIONS_PER_TURN: u32 = 1;
