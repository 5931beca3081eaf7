//! Virtual player decisions.
//!
//! A bot scores candidate actions from the same authoritative state a human
//! client sees and emits the same action values; there is no special-cased
//! mutation path. Aggressive bots close distance and fight; defensive bots
//! collect protective items and keep away from opponents.

use uuid::Uuid;

use crate::game::objects::ObjectKind;
use crate::game::pathfinding;
use crate::game::player::Player;
use crate::game::state::Game;
use crate::game::types::{BotProfile, GameMode, Position, TileKind};

/// What a bot decided to do with its turn. Mirrors the client action set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    Move(Position),
    InteractDoor(Position),
    InitiateCombat(Position),
    SelectObject(ObjectKind),
    EndTurn,
}

/// What a bot decided to do with its combat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCombatAction {
    Attack,
    Evade,
}

/// Objects in pickup/keep preference order, most wanted first.
fn item_priority(profile: BotProfile) -> &'static [ObjectKind] {
    match profile {
        BotProfile::Aggressive => &[
            ObjectKind::Blade,
            ObjectKind::Flag,
            ObjectKind::Boots,
            ObjectKind::Bird,
            ObjectKind::Talisman,
        ],
        BotProfile::Defensive => &[
            ObjectKind::Talisman,
            ObjectKind::Boots,
            ObjectKind::Bird,
            ObjectKind::Flag,
            ObjectKind::Blade,
        ],
    }
}

fn priority_rank(profile: BotProfile, kind: ObjectKind) -> usize {
    item_priority(profile)
        .iter()
        .position(|k| *k == kind)
        .unwrap_or(usize::MAX)
}

/// Decide the bot's next normal-turn action. Returns `EndTurn` when nothing
/// useful is left to do.
pub fn decide_turn_action(game: &Game, bot_id: Uuid) -> BotAction {
    let Some(bot) = game.player(bot_id) else {
        return BotAction::EndTurn;
    };
    let profile = bot.bot_profile.unwrap_or(BotProfile::Aggressive);

    // A pending pickup must be resolved before anything else.
    if let Some(pending) = game.data.pending_pickup {
        if pending.player == bot_id {
            return BotAction::SelectObject(select_discard(profile, bot, pending.object));
        }
    }

    let opponents: Vec<&Player> = game
        .players
        .iter()
        .filter(|p| p.id != bot_id && is_opponent(game, bot, p))
        .collect();

    // Fight an adjacent opponent if the profile wants to.
    if profile == BotProfile::Aggressive && bot.actions_left > 0 {
        if let Some(target) = opponents.iter().find(|p| p.pos.is_adjacent(bot.pos)) {
            return BotAction::InitiateCombat(target.pos);
        }
    }

    let reachable = pathfinding::reachable_tiles(&game.map, bot.pos, bot.moves_left, bot_id);

    // Flag carrier: run home.
    if game.mode == GameMode::Ctf && bot.has_object(ObjectKind::Flag) {
        if let Some(spawn) = bot.spawn_point {
            if let Some(best) = reachable
                .iter()
                .filter(|p| **p != bot.pos)
                .min_by_key(|p| (p.manhattan(spawn), p.y, p.x))
            {
                return BotAction::Move(*best);
            }
        }
    }

    // Head for the most wanted reachable object.
    let mut wanted: Option<(usize, Position)> = None;
    for pos in &reachable {
        if let Some(kind) = game.map.object(*pos) {
            let rank = priority_rank(profile, kind);
            if wanted.map(|(r, _)| rank < r).unwrap_or(true) {
                wanted = Some((rank, *pos));
            }
        }
    }
    if let Some((_, pos)) = wanted {
        if pos != bot.pos {
            return BotAction::Move(pos);
        }
    }

    // Open an adjacent closed door to grow future options.
    if bot.actions_left > 0 {
        if let Some(door) = pathfinding::neighbors(&game.map, bot.pos)
            .into_iter()
            .find(|p| game.map.kind(*p) == TileKind::DoorClosed)
        {
            return BotAction::InteractDoor(door);
        }
    }

    // Otherwise maneuver relative to the opponents.
    if bot.moves_left > 0 && !opponents.is_empty() {
        let score = |pos: &Position| -> usize {
            opponents.iter().map(|p| pos.manhattan(p.pos)).min().unwrap_or(0)
        };
        let here = score(&bot.pos);
        let candidate = match profile {
            BotProfile::Aggressive => reachable
                .iter()
                .filter(|p| **p != bot.pos)
                .min_by_key(|p| (score(p), p.y, p.x)),
            BotProfile::Defensive => reachable
                .iter()
                .filter(|p| **p != bot.pos)
                .max_by_key(|p| (score(p), std::cmp::Reverse((p.y, p.x)))),
        };
        if let Some(best) = candidate {
            let better = match profile {
                BotProfile::Aggressive => score(best) < here,
                BotProfile::Defensive => score(best) > here,
            };
            if better {
                return BotAction::Move(*best);
            }
        }
    }

    BotAction::EndTurn
}

/// Decide the bot's combat action. Defensive bots evade while hurt and able;
/// aggressive bots only evade at death's door.
pub fn decide_combat_action(game: &Game, bot_id: Uuid) -> BotCombatAction {
    let Some(bot) = game.player(bot_id) else {
        return BotCombatAction::Attack;
    };
    let Some(session) = &game.combat else {
        return BotCombatAction::Attack;
    };
    let attempts_left = session.evasions_used(bot_id) < crate::config::game::MAX_EVASION_ATTEMPTS;
    let profile = bot.bot_profile.unwrap_or(BotProfile::Aggressive);
    let health = bot.attributes.health;
    let threshold = match profile {
        BotProfile::Defensive => bot.attributes.max_health / 2,
        BotProfile::Aggressive => 1,
    };
    if attempts_left && health <= threshold {
        BotCombatAction::Evade
    } else {
        BotCombatAction::Attack
    }
}

/// Pick the object to leave behind on a full-inventory pickup: the lowest
/// priority among the inventory plus the found object.
fn select_discard(profile: BotProfile, bot: &Player, found: ObjectKind) -> ObjectKind {
    bot.inventory
        .iter()
        .copied()
        .chain(std::iter::once(found))
        .max_by_key(|kind| priority_rank(profile, *kind))
        .unwrap_or(found)
}

fn is_opponent(game: &Game, bot: &Player, other: &Player) -> bool {
    if game.mode == GameMode::Ctf {
        bot.team() != other.team()
    } else {
        true
    }
}
