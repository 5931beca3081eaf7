//! Combat resolution.
//!
//! An isolated 1v1 encounter: `CombatStart → AttackerTurn ⇄ DefenderTurn →
//! CombatEnd`. Attacks oppose an attack roll to a defense roll; the positive
//! difference is damage, and health never goes below zero. A combatant may
//! attempt to evade instead, with a fixed success probability and a bounded
//! number of attempts per combat. All randomness flows through the caller's
//! RNG.

use log::debug;
use serde::Serialize;
use uuid::Uuid;

use crate::config::game::{EVASION_SUCCESS_RATE, MAX_EVASION_ATTEMPTS};
use crate::game::objects;
use crate::game::state::{Game, GameError, GameEvent};
use crate::game::types::{CombatTurn, GamePhase, PlayerFlag, TileKind};

#[derive(Debug, Clone, Serialize)]
pub struct CombatSession {
    pub attacker: Uuid,
    pub defender: Uuid,
    pub turn: CombatTurn,
    pub attacker_evasions: u32,
    pub defender_evasions: u32,
}

impl CombatSession {
    pub fn new(attacker: Uuid, defender: Uuid) -> Self {
        Self {
            attacker,
            defender,
            turn: CombatTurn::Attacker,
            attacker_evasions: 0,
            defender_evasions: 0,
        }
    }

    pub fn current_actor(&self) -> Uuid {
        match self.turn {
            CombatTurn::Attacker => self.attacker,
            CombatTurn::Defender => self.defender,
        }
    }

    pub fn opponent_of(&self, id: Uuid) -> Option<Uuid> {
        if id == self.attacker {
            Some(self.defender)
        } else if id == self.defender {
            Some(self.attacker)
        } else {
            None
        }
    }

    pub fn evasions_used(&self, id: Uuid) -> u32 {
        if id == self.attacker {
            self.attacker_evasions
        } else {
            self.defender_evasions
        }
    }

    fn record_evasion(&mut self, id: Uuid) {
        if id == self.attacker {
            self.attacker_evasions += 1;
        } else {
            self.defender_evasions += 1;
        }
    }

    fn swap_turn(&mut self) {
        self.turn = match self.turn {
            CombatTurn::Attacker => CombatTurn::Defender,
            CombatTurn::Defender => CombatTurn::Attacker,
        };
    }
}

fn session_actor_check(game: &Game, actor: Uuid) -> Result<Uuid, GameError> {
    let session = game
        .combat
        .as_ref()
        .ok_or_else(|| GameError::Illegal("no combat in progress".to_string()))?;
    if session.current_actor() != actor {
        return Err(GameError::Illegal("it is not your combat turn".to_string()));
    }
    session
        .opponent_of(actor)
        .ok_or_else(|| GameError::Internal("combat actor has no opponent".to_string()))
}

pub fn resolve_attack(
    game: &mut Game,
    actor: Uuid,
    rng: &mut impl rand::Rng,
) -> Result<Vec<GameEvent>, GameError> {
    let opponent = session_actor_check(game, actor)?;
    let ai = game
        .index_of(actor)
        .ok_or_else(|| GameError::Internal("attacker not in game".to_string()))?;
    let di = game
        .index_of(opponent)
        .ok_or_else(|| GameError::Internal("defender not in game".to_string()))?;

    // Before-attack hooks may decide the combat outright.
    for kind in game.players[ai].inventory.clone() {
        if let Some(hook) = objects::effects(kind).before_attack {
            if hook(&game.players[ai], &game.players[di]) {
                debug!("[Combat] {:?} ends the combat before the roll", kind);
                return Ok(finish_combat(game, Some(actor), Some(opponent), false));
            }
        }
    }

    let attacker_on_ice = game.players[ai].has_flag(PlayerFlag::OnIce);
    let defender_on_ice = game.players[di].has_flag(PlayerFlag::OnIce);
    let (attack_roll, defense_roll) = if game.data.debug {
        // Debug mode pins the dice: attacker max, defender min.
        let a = &game.players[ai].attributes.attack;
        let d = &game.players[di].attributes.defense;
        (a.value + a.die.sides(), d.value + 1)
    } else {
        (
            game.players[ai].attributes.attack_roll(attacker_on_ice, rng),
            game.players[di].attributes.defense_roll(defender_on_ice, rng),
        )
    };

    let damage = attack_roll.saturating_sub(defense_roll);
    game.players[di].attributes.health =
        game.players[di].attributes.health.saturating_sub(damage);
    game.players[ai].stats.damage_dealt += damage;
    game.players[di].stats.damage_taken += damage;

    let mut events = vec![GameEvent::CombatAttacked {
        attacker: actor,
        attack_roll,
        defense_roll,
        damage,
    }];

    if game.players[di].attributes.health == 0 {
        events.extend(finish_combat(game, Some(actor), Some(opponent), false));
    } else if let Some(session) = game.combat.as_mut() {
        session.swap_turn();
    }
    Ok(events)
}

pub fn resolve_evasion(
    game: &mut Game,
    actor: Uuid,
    rng: &mut impl rand::Rng,
) -> Result<Vec<GameEvent>, GameError> {
    session_actor_check(game, actor)?;
    let used = game.combat.as_ref().map(|s| s.evasions_used(actor)).unwrap_or(0);
    if used >= MAX_EVASION_ATTEMPTS {
        return Err(GameError::Illegal("no evasion attempts left".to_string()));
    }
    if let Some(session) = game.combat.as_mut() {
        session.record_evasion(actor);
    }
    if let Some(player) = game.player_mut(actor) {
        player.evasion_attempts += 1;
    }

    // Success is a fixed-probability draw, independent of attributes.
    let success = game.data.debug || rng.random::<f64>() < EVASION_SUCCESS_RATE;
    let attempts_left = MAX_EVASION_ATTEMPTS - used - 1;
    let mut events = vec![GameEvent::CombatEvaded { player: actor, success, attempts_left }];

    if success {
        if let Some(player) = game.player_mut(actor) {
            player.stats.evasions += 1;
        }
        events.extend(finish_combat(game, None, None, true));
    } else if let Some(session) = game.combat.as_mut() {
        session.swap_turn();
    }
    Ok(events)
}

/// A combatant disappeared mid-combat; their opponent wins by forfeit.
pub(crate) fn forfeit(game: &mut Game, loser: Uuid, winner: Uuid) -> Vec<GameEvent> {
    debug!("[Combat] forfeit: {loser} concedes to {winner}");
    finish_combat(game, Some(winner), Some(loser), false)
}

/// Close the combat: reset and relocate the loser, apply end-of-combat
/// hooks and stats, and hand control back to normal turn flow.
fn finish_combat(
    game: &mut Game,
    winner: Option<Uuid>,
    loser: Option<Uuid>,
    escaped: bool,
) -> Vec<GameEvent> {
    let Some(session) = game.combat.take() else {
        return vec![];
    };
    for id in [session.attacker, session.defender] {
        if let Some(player) = game.player_mut(id) {
            player.clear_flag(PlayerFlag::InCombat);
            player.evasion_attempts = 0;
        }
    }

    if let (Some(winner_id), Some(loser_id)) = (winner, loser) {
        if let (Some(wi), Some(li)) = (game.index_of(winner_id), game.index_of(loser_id)) {
            // Relocate while the loser still occupies their tile so the
            // search lands on a genuinely different free tile.
            let original = game.players[li].pos;
            let spawn = game.players[li].spawn_point.unwrap_or(original);
            let safe = game.map.nearest_free_tile(original, spawn);
            game.map.set_occupant(original, None);
            game.map.set_occupant(safe, Some(loser_id));
            game.players[li].pos = safe;
            if game.map.kind(safe) == TileKind::Ice {
                game.players[li].set_flag(PlayerFlag::OnIce);
            } else {
                game.players[li].clear_flag(PlayerFlag::OnIce);
            }

            game.players[li].attributes.health = game.players[li].attributes.max_health;
            game.players[li].set_flag(PlayerFlag::DeadInCombat);
            game.players[li].stats.defeats += 1;

            let mut suppress_victory = false;
            for kind in game.players[li].inventory.clone() {
                if let Some(hook) = objects::effects(kind).on_combat_end {
                    if hook(&game.players[li], false).suppress_opponent_victory {
                        suppress_victory = true;
                    }
                }
            }
            for kind in game.players[wi].inventory.clone() {
                if let Some(hook) = objects::effects(kind).on_combat_end {
                    hook(&game.players[wi], true);
                }
            }
            if !suppress_victory {
                game.players[wi].stats.victories += 1;
            }
        }
    }

    let mut events = vec![GameEvent::CombatEnded { winner, loser, escaped }];
    game.phase = GamePhase::PlayerActing;

    // Losing the combat ends the loser's turn if they were the one acting.
    if let Some(loser_id) = loser {
        if game.active_player().id == loser_id && !game.data.game_over {
            events.extend(game.end_turn_internal());
        }
    }
    if let Some(event) = game.check_win() {
        events.push(event);
    }
    events
}
