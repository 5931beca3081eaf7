//! Authoritative per-room game state.
//!
//! `Game` owns the map, the players, the turn order and the combat sub-state,
//! and exposes the mutation operations the room dispatches. Every operation
//! validates legality first and returns the list of `GameEvent`s it produced;
//! the room turns those into broadcasts and timer decisions. No timer is ever
//! armed from inside a mutation.

use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

use crate::config::game::{MAX_INVENTORY, VICTORIES_TO_WIN, ICE_FORCED_SLIDE};
use crate::game::combat::{self, CombatSession};
use crate::game::map::{GameMap, MapDescriptor};
use crate::game::objects::{self, ObjectKind};
use crate::game::pathfinding;
use crate::game::player::{build_attributes, AttributeBonus, DiceChoice, Player};
use crate::game::types::{BotProfile, GameMode, GamePhase, PlayerFlag, Position, TileKind};

#[derive(Debug, Error)]
pub enum GameError {
    /// The caller attempted something outside current legality. Rejected
    /// with no state change; surfaced to the caller as a notification.
    #[error("{0}")]
    Illegal(String),
    /// Unexpected internal fault. The dispatch boundary redirects the
    /// offending channel and leaves the room state untouched.
    #[error("internal game error: {0}")]
    Internal(String),
}

fn illegal(msg: impl Into<String>) -> GameError {
    GameError::Illegal(msg.into())
}

/// What a mutation did, for the room to broadcast and schedule around.
#[derive(Debug, Clone, Serialize)]
pub enum GameEvent {
    TurnEnded { previous: Uuid },
    /// A new active player was selected; the turn opens after the
    /// transition delay.
    TurnStarted { player: Uuid },
    /// The transition delay elapsed; the active player may now act.
    TurnOpened { player: Uuid },
    Moved { player: Uuid, path: Vec<Position>, cost: u32 },
    Slid { player: Uuid, to: Position },
    ObjectPickedUp { player: Uuid, object: ObjectKind },
    ObjectDropped { player: Uuid, object: ObjectKind, at: Position },
    PickupPending { player: Uuid, object: ObjectKind },
    DoorToggled { at: Position, open: bool },
    CombatStarted { attacker: Uuid, defender: Uuid },
    CombatAttacked { attacker: Uuid, attack_roll: u32, defense_roll: u32, damage: u32 },
    CombatEvaded { player: Uuid, success: bool, attempts_left: u32 },
    CombatEnded { winner: Option<Uuid>, loser: Option<Uuid>, escaped: bool },
    DebugToggled { on: bool },
    PlayerDisconnected { player: Uuid },
    PlayerReconnected { player: Uuid },
    GameOver { winner: Uuid },
}

/// An object waiting for the player to choose what to discard.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PendingPickup {
    pub player: Uuid,
    pub object: ObjectKind,
}

/// Global transient flags of a running game.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GameData {
    pub debug: bool,
    pub transitioning: bool,
    pub turn_ending: bool,
    pub pending_pickup: Option<PendingPickup>,
    pub game_over: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GameStats {
    pub turns: u32,
    pub duration_secs: u64,
    pub doors_toggled_pct: f32,
    pub tiles_visited_pct: f32,
    pub flag_holders: u32,
    #[serde(skip)]
    started: Option<Instant>,
    #[serde(skip)]
    doors_toggled: BTreeSet<Position>,
    #[serde(skip)]
    visited: BTreeSet<Position>,
    #[serde(skip)]
    flag_holder_ids: BTreeSet<Uuid>,
}

/// What a joining participant brings to game creation.
#[derive(Debug, Clone)]
pub struct PlayerSpec {
    pub id: Uuid,
    pub name: String,
    pub avatar: String,
    pub bonus: AttributeBonus,
    pub dice: DiceChoice,
    pub admin: bool,
    pub profile: Option<BotProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Game {
    pub code: String,
    pub mode: GameMode,
    pub map: GameMap,
    /// Players in turn order (speed-descending, stable on ties).
    pub players: Vec<Player>,
    pub active: usize,
    pub phase: GamePhase,
    pub data: GameData,
    pub stats: GameStats,
    pub combat: Option<CombatSession>,
}

impl Game {
    pub fn new(
        code: &str,
        descriptor: &MapDescriptor,
        specs: Vec<PlayerSpec>,
        mode: GameMode,
    ) -> Result<Self, GameError> {
        let mut map = GameMap::from_descriptor(descriptor)
            .map_err(|e| GameError::Internal(format!("map rejected at game creation: {e}")))?;

        let mut players: Vec<Player> = specs
            .into_iter()
            .map(|spec| {
                let mut player = match spec.profile {
                    Some(profile) => Player::virtual_player(spec.id, &spec.name, profile),
                    None => Player::new(
                        spec.id,
                        &spec.name,
                        &spec.avatar,
                        build_attributes(spec.bonus, spec.dice),
                    ),
                };
                if spec.admin {
                    player.set_flag(PlayerFlag::Admin);
                }
                player
            })
            .collect();

        // Turn order is speed-descending; the sort is stable so join order
        // breaks ties.
        players.sort_by_key(|p| std::cmp::Reverse(p.attributes.speed));

        if descriptor.spawns.len() < players.len() {
            return Err(GameError::Internal(format!(
                "map {} has {} spawn points for {} players",
                descriptor.id,
                descriptor.spawns.len(),
                players.len()
            )));
        }

        let mut stats = GameStats::default();
        let walkable = map.walkable_tile_count();
        for (i, player) in players.iter_mut().enumerate() {
            let spawn = descriptor.spawns[i];
            player.pos = spawn;
            player.spawn_point = Some(spawn);
            map.set_occupant(spawn, Some(player.id));
            player.record_visit(spawn, walkable);
            stats.visited.insert(spawn);
            if mode == GameMode::Ctf {
                let team = if i % 2 == 0 { PlayerFlag::RedTeam } else { PlayerFlag::BlueTeam };
                player.set_flag(team);
            }
        }

        Ok(Self {
            code: code.to_string(),
            mode,
            map,
            players,
            active: 0,
            phase: GamePhase::WaitingForTurn,
            data: GameData::default(),
            stats,
            combat: None,
        })
    }

    // ---- accessors -------------------------------------------------------

    pub fn active_player(&self) -> &Player {
        &self.players[self.active]
    }

    fn active_player_mut(&mut self) -> &mut Player {
        &mut self.players[self.active]
    }

    pub fn player(&self, id: Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: Uuid) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn index_of(&self, id: Uuid) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn connected_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_connected())
    }

    /// The tiles the active player can currently reach, for the targeted
    /// highlight. A Bird holder without the Flag may go anywhere free.
    pub fn accessible_tiles(&self) -> Vec<Position> {
        let player = self.active_player();
        if self.free_move_allowed(player) {
            let mut out = Vec::new();
            for y in 0..self.map.height() {
                for x in 0..self.map.width() {
                    let pos = Position::new(x, y);
                    if self.map.is_free(pos) || pos == player.pos {
                        out.push(pos);
                    }
                }
            }
            return out;
        }
        pathfinding::reachable_tiles(&self.map, player.pos, player.moves_left, player.id)
            .into_iter()
            .collect()
    }

    fn free_move_allowed(&self, player: &Player) -> bool {
        player
            .inventory
            .iter()
            .filter_map(|kind| objects::effects(*kind).on_move)
            .any(|hook| hook(player))
    }

    /// Refresh derived statistics and return a snapshot for broadcast.
    pub fn snapshot(&mut self) -> Game {
        self.refresh_stats();
        self.clone()
    }

    fn refresh_stats(&mut self) {
        if let Some(started) = self.stats.started {
            self.stats.duration_secs = started.elapsed().as_secs();
        }
        let doors = self.map.door_count();
        if doors > 0 {
            self.stats.doors_toggled_pct =
                self.stats.doors_toggled.len() as f32 / doors as f32 * 100.0;
        }
        let walkable = self.map.walkable_tile_count();
        if walkable > 0 {
            self.stats.tiles_visited_pct =
                self.stats.visited.len() as f32 / walkable as f32 * 100.0;
        }
        self.stats.flag_holders = self.stats.flag_holder_ids.len() as u32;
    }

    // ---- turn flow -------------------------------------------------------

    /// Start the match: stamp the clock and activate the first eligible
    /// player.
    pub fn start_first_turn(&mut self) -> Vec<GameEvent> {
        self.stats.started = Some(Instant::now());
        self.stats.turns = 1;
        if !self.players[self.active].is_connected() {
            if let Some(next) = self.next_eligible(self.active + 1) {
                self.active = next;
            }
        }
        self.begin_transition()
    }

    /// Explicit or forced end of turn. `actor` is `None` when the scheduler
    /// forces the call. Advances the active player immediately; the next
    /// turn only becomes actionable once `open_turn` runs.
    pub fn end_turn(&mut self, actor: Option<Uuid>) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_running()?;
        if self.combat.is_some() {
            return Err(illegal("cannot end the turn during combat"));
        }
        if let Some(id) = actor {
            if id != self.active_player().id {
                return Err(illegal("it is not your turn"));
            }
        }
        Ok(self.end_turn_internal())
    }

    /// Shared advance logic, also used when a combat ends the active
    /// player's turn.
    pub(crate) fn end_turn_internal(&mut self) -> Vec<GameEvent> {
        let previous = self.active_player().id;
        let mut events = vec![GameEvent::TurnEnded { previous }];

        // An unresolved pickup is abandoned when the turn ends.
        self.data.pending_pickup = None;
        self.data.turn_ending = true;
        self.phase = GamePhase::TurnEnding;
        self.active_player_mut().clear_flag(PlayerFlag::ActiveTurn);

        if let Some(next) = self.next_eligible(self.active + 1) {
            self.active = next;
        }
        self.stats.turns += 1;
        events.extend(self.begin_transition());
        events
    }

    /// Select the current active player and enter the transition window.
    fn begin_transition(&mut self) -> Vec<GameEvent> {
        self.data.turn_ending = false;
        self.data.transitioning = true;
        self.phase = GamePhase::WaitingForTurn;
        let player = self.active_player_mut();
        player.reset_turn_budget();
        player.evasion_attempts = 0;
        player.set_flag(PlayerFlag::ActiveTurn);
        vec![GameEvent::TurnStarted { player: player.id }]
    }

    /// Called by the scheduler when the transition delay elapses.
    pub fn open_turn(&mut self) -> Vec<GameEvent> {
        if self.data.game_over || !self.data.transitioning {
            return vec![];
        }
        self.data.transitioning = false;
        self.phase = GamePhase::PlayerActing;
        vec![GameEvent::TurnOpened { player: self.active_player().id }]
    }

    fn next_eligible(&self, from: usize) -> Option<usize> {
        let n = self.players.len();
        (0..n).map(|offset| (from + offset) % n).find(|&i| self.players[i].is_connected())
    }

    fn ensure_running(&self) -> Result<(), GameError> {
        if self.data.game_over {
            return Err(illegal("the game is over"));
        }
        Ok(())
    }

    fn ensure_acting(&self, actor: Uuid) -> Result<(), GameError> {
        self.ensure_running()?;
        if self.combat.is_some() || self.phase != GamePhase::PlayerActing {
            return Err(illegal("you cannot act right now"));
        }
        if actor != self.active_player().id {
            return Err(illegal("it is not your turn"));
        }
        if self.data.pending_pickup.is_some() {
            return Err(illegal("choose an object to keep first"));
        }
        Ok(())
    }

    // ---- movement --------------------------------------------------------

    pub fn move_player(&mut self, actor: Uuid, target: Position) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_acting(actor)?;
        if !self.map.in_bounds(target) {
            return Err(illegal("target tile is outside the map"));
        }
        let player = self.active_player();
        if target == player.pos {
            return Err(illegal("you are already on that tile"));
        }

        let free_move = self.free_move_allowed(player);
        let (path, cost) = if free_move {
            if !self.map.is_free(target) {
                return Err(illegal("that tile is blocked"));
            }
            (vec![target], 0)
        } else {
            let path = pathfinding::shortest_path(
                &self.map,
                player.pos,
                target,
                player.moves_left,
                player.id,
            )
            .ok_or_else(|| illegal("that tile is out of reach"))?;
            (path.tiles, path.cost)
        };

        self.phase = GamePhase::Moving;
        let mut events = self.walk(actor, path, cost)?;
        self.phase = GamePhase::PlayerActing;

        if let Some(event) = self.check_win() {
            events.push(event);
        }
        Ok(events)
    }

    fn walk(&mut self, actor: Uuid, path: Vec<Position>, cost: u32) -> Result<Vec<GameEvent>, GameError> {
        let idx = self
            .index_of(actor)
            .ok_or_else(|| GameError::Internal("moving player not in game".to_string()))?;
        let walkable = self.map.walkable_tile_count();
        let origin = self.players[idx].pos;
        let mut events = Vec::new();

        self.map.set_occupant(origin, None);
        let mut current = origin;
        for step in &path {
            current = *step;
            self.players[idx].record_visit(current, walkable);
            self.stats.visited.insert(current);
        }

        events.push(GameEvent::Moved { player: actor, path: path.clone(), cost });
        self.players[idx].moves_left = self.players[idx].moves_left.saturating_sub(cost);

        // Ice rule: sliding costs nothing; whether landing forces a slide is
        // configurable.
        if ICE_FORCED_SLIDE {
            let mut prev = if path.len() >= 2 { path[path.len() - 2] } else { origin };
            while self.map.kind(current) == TileKind::Ice {
                let Some(next) = Self::slide_target(prev, current) else {
                    break;
                };
                if !self.map.is_free(next) {
                    break;
                }
                prev = current;
                current = next;
                self.players[idx].record_visit(current, walkable);
                self.stats.visited.insert(current);
                events.push(GameEvent::Slid { player: actor, to: current });
            }
        }

        self.players[idx].pos = current;
        self.map.set_occupant(current, Some(actor));
        if self.map.kind(current) == TileKind::Ice {
            self.players[idx].set_flag(PlayerFlag::OnIce);
        } else {
            self.players[idx].clear_flag(PlayerFlag::OnIce);
        }

        events.extend(self.resolve_pickup(idx, current));
        Ok(events)
    }

    /// One tile further along the direction of the last step taken.
    fn slide_target(prev: Position, current: Position) -> Option<Position> {
        let dx = current.x as isize - prev.x as isize;
        let dy = current.y as isize - prev.y as isize;
        if dx == 0 && dy == 0 {
            return None;
        }
        let nx = current.x as isize + dx.signum();
        let ny = current.y as isize + dy.signum();
        if nx < 0 || ny < 0 {
            return None;
        }
        Some(Position::new(nx as usize, ny as usize))
    }

    fn resolve_pickup(&mut self, idx: usize, pos: Position) -> Vec<GameEvent> {
        let Some(object) = self.map.object(pos) else {
            return vec![];
        };
        let player_id = self.players[idx].id;
        if self.players[idx].inventory.len() < MAX_INVENTORY {
            self.map.take_object(pos);
            self.players[idx].pick_up(object);
            if object == ObjectKind::Flag {
                self.stats.flag_holder_ids.insert(player_id);
            }
            vec![GameEvent::ObjectPickedUp { player: player_id, object }]
        } else {
            self.data.pending_pickup = Some(PendingPickup { player: player_id, object });
            vec![GameEvent::PickupPending { player: player_id, object }]
        }
    }

    /// Resolve a full-inventory pickup by naming the object to leave behind:
    /// either the freshly found one, or an inventory object to swap out.
    pub fn select_object(&mut self, actor: Uuid, discard: ObjectKind) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_running()?;
        let pending = self
            .data
            .pending_pickup
            .filter(|p| p.player == actor)
            .ok_or_else(|| illegal("no object selection is pending for you"))?;

        let idx = self
            .index_of(actor)
            .ok_or_else(|| GameError::Internal("selecting player not in game".to_string()))?;
        let at = self.players[idx].pos;
        let mut events = Vec::new();

        if discard == pending.object {
            // Keep the inventory; the found object stays on the tile.
            events.push(GameEvent::ObjectDropped { player: actor, object: discard, at });
        } else {
            if !self.players[idx].drop_object(discard) {
                return Err(illegal("you do not hold that object"));
            }
            self.map.take_object(at);
            self.players[idx].pick_up(pending.object);
            if pending.object == ObjectKind::Flag {
                self.stats.flag_holder_ids.insert(actor);
            }
            self.map.place_object(at, discard);
            events.push(GameEvent::ObjectPickedUp { player: actor, object: pending.object });
            events.push(GameEvent::ObjectDropped { player: actor, object: discard, at });
        }
        self.data.pending_pickup = None;

        if let Some(event) = self.check_win() {
            events.push(event);
        }
        Ok(events)
    }

    // ---- doors and combat entry -----------------------------------------

    pub fn interact_door(&mut self, actor: Uuid, target: Position) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_acting(actor)?;
        if !self.map.in_bounds(target) {
            return Err(illegal("target tile is outside the map"));
        }
        let player = self.active_player();
        if player.actions_left == 0 {
            return Err(illegal("no actions left this turn"));
        }
        if !player.pos.is_adjacent(target) {
            return Err(illegal("that door is not next to you"));
        }
        if !self.map.kind(target).is_door() {
            return Err(illegal("that tile is not a door"));
        }
        if self.map.occupant(target).is_some() {
            return Err(illegal("the door is blocked by a player"));
        }

        self.phase = GamePhase::DoorInteraction;
        let open = self
            .map
            .toggle_door(target)
            .ok_or_else(|| GameError::Internal("door tile stopped being a door".to_string()))?;
        self.active_player_mut().actions_left -= 1;
        self.stats.doors_toggled.insert(target);
        self.phase = GamePhase::PlayerActing;

        Ok(vec![GameEvent::DoorToggled { at: target, open }])
    }

    pub fn initiate_combat(&mut self, actor: Uuid, target: Position) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_acting(actor)?;
        if !self.map.in_bounds(target) {
            return Err(illegal("target tile is outside the map"));
        }
        let attacker = self.active_player();
        if attacker.actions_left == 0 {
            return Err(illegal("no actions left this turn"));
        }
        if !attacker.pos.is_adjacent(target) {
            return Err(illegal("that player is not in proximity"));
        }
        let defender_id = self
            .map
            .occupant(target)
            .ok_or_else(|| illegal("there is no player on that tile"))?;
        if defender_id == actor {
            return Err(illegal("you cannot attack yourself"));
        }
        let defender = self
            .player(defender_id)
            .ok_or_else(|| GameError::Internal("occupant not in player list".to_string()))?;
        if self.mode == GameMode::Ctf
            && attacker.team().is_some()
            && attacker.team() == defender.team()
        {
            return Err(illegal("you cannot attack a teammate"));
        }

        self.active_player_mut().actions_left -= 1;
        for id in [actor, defender_id] {
            if let Some(p) = self.player_mut(id) {
                p.set_flag(PlayerFlag::InCombat);
                p.evasion_attempts = 0;
                p.stats.combats += 1;
            }
        }
        self.combat = Some(CombatSession::new(actor, defender_id));
        self.phase = GamePhase::Combat;
        Ok(vec![GameEvent::CombatStarted { attacker: actor, defender: defender_id }])
    }

    pub fn attack(&mut self, actor: Uuid, rng: &mut impl rand::Rng) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_running()?;
        combat::resolve_attack(self, actor, rng)
    }

    pub fn evade(&mut self, actor: Uuid, rng: &mut impl rand::Rng) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_running()?;
        combat::resolve_evasion(self, actor, rng)
    }

    // ---- misc operations -------------------------------------------------

    pub fn toggle_debug(&mut self, actor: Uuid) -> Result<Vec<GameEvent>, GameError> {
        let player = self
            .player(actor)
            .ok_or_else(|| illegal("you are not part of this game"))?;
        if !player.has_flag(PlayerFlag::Admin) {
            return Err(illegal("only the organizer can toggle debug mode"));
        }
        self.data.debug = !self.data.debug;
        Ok(vec![GameEvent::DebugToggled { on: self.data.debug }])
    }

    /// Mark a participant as disconnected. The room decides whether to force
    /// a turn skip or tear the game down.
    pub fn disconnect(&mut self, player_id: Uuid) -> Vec<GameEvent> {
        let Some(player) = self.player_mut(player_id) else {
            return vec![];
        };
        player.set_flag(PlayerFlag::Disconnected);
        let mut events = vec![GameEvent::PlayerDisconnected { player: player_id }];

        // A combat against a vanished opponent resolves as a forfeit.
        let opponent = self.combat.as_ref().and_then(|s| s.opponent_of(player_id));
        if let Some(opponent) = opponent {
            events.extend(combat::forfeit(self, player_id, opponent));
        }
        if let Some(event) = self.check_win() {
            events.push(event);
        }
        events
    }

    pub fn reconnect(&mut self, player_id: Uuid) -> Vec<GameEvent> {
        match self.player_mut(player_id) {
            Some(player) => {
                player.clear_flag(PlayerFlag::Disconnected);
                vec![GameEvent::PlayerReconnected { player: player_id }]
            }
            None => vec![],
        }
    }

    // ---- win conditions --------------------------------------------------

    /// Evaluated after every mutation. CTF ends when a flag holder stands on
    /// their own spawn point; Classical ends at the victory threshold; either
    /// mode ends when a single connected player remains.
    pub(crate) fn check_win(&mut self) -> Option<GameEvent> {
        if self.data.game_over {
            return None;
        }
        let winner = self.find_winner()?;
        self.finish(winner);
        Some(GameEvent::GameOver { winner })
    }

    fn find_winner(&self) -> Option<Uuid> {
        match self.mode {
            GameMode::Ctf => {
                if let Some(p) = self.players.iter().find(|p| {
                    p.has_object(ObjectKind::Flag) && p.spawn_point == Some(p.pos)
                }) {
                    return Some(p.id);
                }
            }
            GameMode::Classical => {
                if let Some(p) = self
                    .players
                    .iter()
                    .find(|p| p.stats.victories >= VICTORIES_TO_WIN)
                {
                    return Some(p.id);
                }
            }
        }
        let mut connected = self.connected_players();
        match (connected.next(), connected.next()) {
            (Some(last), None) => Some(last.id),
            _ => None,
        }
    }

    fn finish(&mut self, winner: Uuid) {
        log::info!("[Game] {} over, winner {}", self.code, winner);
        self.data.game_over = true;
        self.data.transitioning = false;
        self.data.pending_pickup = None;
        self.phase = GamePhase::GameOver;
        self.combat = None;
        self.refresh_stats();

        // End-of-match cleanup: fire every held object's reset hook and
        // restore transient player state.
        for player in &mut self.players {
            for kind in player.inventory.clone() {
                if let Some(hook) = objects::effects(kind).on_player_reset {
                    hook(player);
                }
            }
            player.attributes.health = player.attributes.max_health;
            player.clear_flag(PlayerFlag::ActiveTurn);
            player.clear_flag(PlayerFlag::InCombat);
            player.clear_flag(PlayerFlag::OnIce);
            player.evasion_attempts = 0;
        }
    }
}
