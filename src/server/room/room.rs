//! Room actor: one per room code.
//!
//! Owns the sub-room membership (waiting, game, stats), the authoritative
//! `Game` once started, and every timer attached to it. All inbound actions
//! pass through the dispatch wrapper here: illegal actions become a
//! notification to the offending channel, internal faults additionally
//! redirect that channel home, and the rest of the room is never affected.
//! Timers are armed from the events the game model returns, never from
//! inside the mutations.

use actix::prelude::*;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use crate::config::game::{
    BOT_THINK_DELAY, COMBAT_TURN_DURATION, COMBAT_TURN_DURATION_NO_EVASION,
    MAX_EVASION_ATTEMPTS, TRANSITION_DELAY, TURN_DURATION,
};
use crate::config::rooms::MIN_PLAYERS;
use crate::game::map::MapDescriptor;
use crate::game::player::{AttributeBonus, DiceChoice};
use crate::game::state::{Game, GameError, GameEvent, PlayerSpec};
use crate::game::types::{BotProfile, GamePhase, Position};
use crate::game::virtual_player::{self, BotAction, BotCombatAction};
use crate::server::room::messages::{
    ClientCommand, ClientEvent, Connect, Disconnect, RosterEntry, ServerEvent,
};
use crate::server::room::registry::{RoomClosed, RoomRegistry};
use crate::server::room::session::RoomSession;

/// The sub-room a connected participant currently belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubRoom {
    Waiting,
    Game,
    Stats,
}

struct Member {
    addr: Addr<RoomSession>,
    name: String,
    avatar: String,
    bonus: AttributeBonus,
    dice: DiceChoice,
    sub_room: SubRoom,
    is_admin: bool,
}

struct BotEntry {
    id: Uuid,
    name: String,
    profile: BotProfile,
}

pub struct Room {
    code: String,
    registry: Addr<RoomRegistry>,
    descriptor: MapDescriptor,
    locked: bool,
    members: HashMap<Uuid, Member>,
    bots: Vec<BotEntry>,
    game: Option<Game>,

    turn_remaining: u64,
    combat_remaining: u64,
    turn_tick: Option<SpawnHandle>,
    combat_tick: Option<SpawnHandle>,
    transition_timer: Option<SpawnHandle>,
    bot_timer: Option<SpawnHandle>,
}

impl Actor for Room {
    type Context = Context<Self>;

    fn stopped(&mut self, _: &mut Self::Context) {
        // Timers die with the actor; the registry must forget the code.
        self.registry.do_send(RoomClosed { code: self.code.clone() });
    }
}

impl Room {
    pub fn new(code: String, descriptor: MapDescriptor, registry: Addr<RoomRegistry>) -> Self {
        Self {
            code,
            registry,
            descriptor,
            locked: false,
            members: HashMap::new(),
            bots: Vec::new(),
            game: None,
            turn_remaining: 0,
            combat_remaining: 0,
            turn_tick: None,
            combat_tick: None,
            transition_timer: None,
            bot_timer: None,
        }
    }

    // ---- broadcast primitives -------------------------------------------

    fn broadcast_where(&self, pred: impl Fn(&Uuid, &SubRoom) -> bool, event: ServerEvent) {
        for (id, member) in &self.members {
            if pred(id, &member.sub_room) {
                member.addr.do_send(event.clone());
            }
        }
    }

    fn broadcast_waiting(&self, event: ServerEvent) {
        self.broadcast_where(|_, sub| *sub == SubRoom::Waiting, event);
    }

    fn broadcast_game(&self, event: ServerEvent) {
        self.broadcast_where(|_, sub| *sub == SubRoom::Game, event);
    }

    fn broadcast_stats(&self, event: ServerEvent) {
        self.broadcast_where(|_, sub| *sub == SubRoom::Stats, event);
    }

    fn send_to(&self, player_id: Uuid, event: ServerEvent) {
        if let Some(member) = self.members.get(&player_id) {
            member.addr.do_send(event);
        }
    }

    // ---- waiting room ----------------------------------------------------

    fn roster(&self) -> Vec<RosterEntry> {
        let mut entries: Vec<RosterEntry> = self
            .members
            .iter()
            .filter(|(_, m)| m.sub_room == SubRoom::Waiting)
            .map(|(id, m)| RosterEntry {
                player_id: *id,
                name: m.name.clone(),
                avatar: m.avatar.clone(),
                is_admin: m.is_admin,
                is_virtual: false,
            })
            .collect();
        entries.extend(self.bots.iter().map(|bot| RosterEntry {
            player_id: bot.id,
            name: bot.name.clone(),
            avatar: "robot".to_string(),
            is_admin: false,
            is_virtual: true,
        }));
        entries
    }

    fn send_roster(&self) {
        self.broadcast_waiting(ServerEvent::RosterUpdate {
            players: self.roster(),
            locked: self.locked,
        });
    }

    fn waiting_count(&self) -> usize {
        self.members.values().filter(|m| m.sub_room == SubRoom::Waiting).count() + self.bots.len()
    }

    fn is_admin(&self, player_id: Uuid) -> bool {
        self.members.get(&player_id).map(|m| m.is_admin).unwrap_or(false)
    }

    fn start_game(&mut self, actor: Uuid, ctx: &mut Context<Self>) -> Result<(), GameError> {
        if self.game.is_some() {
            return Err(GameError::Illegal("the game has already started".to_string()));
        }
        if !self.is_admin(actor) {
            return Err(GameError::Illegal("only the organizer can start the game".to_string()));
        }
        let count = self.waiting_count();
        if count < MIN_PLAYERS {
            return Err(GameError::Illegal(format!(
                "at least {MIN_PLAYERS} players are required"
            )));
        }
        if count > self.descriptor.size.max_players() {
            return Err(GameError::Illegal(format!(
                "this map allows at most {} players",
                self.descriptor.size.max_players()
            )));
        }

        let mut specs: Vec<PlayerSpec> = self
            .members
            .iter()
            .filter(|(_, m)| m.sub_room == SubRoom::Waiting)
            .map(|(id, m)| PlayerSpec {
                id: *id,
                name: m.name.clone(),
                avatar: m.avatar.clone(),
                bonus: m.bonus,
                dice: m.dice,
                admin: m.is_admin,
                profile: None,
            })
            .collect();
        specs.extend(self.bots.iter().map(|bot| PlayerSpec {
            id: bot.id,
            name: bot.name.clone(),
            avatar: "robot".to_string(),
            bonus: AttributeBonus::Health,
            dice: DiceChoice::Attack,
            admin: false,
            profile: Some(bot.profile),
        }));

        let mut game = Game::new(&self.code, &self.descriptor, specs, self.descriptor.mode)?;
        let events = game.start_first_turn();
        self.game = Some(game);

        for member in self.members.values_mut() {
            if member.sub_room == SubRoom::Waiting {
                member.sub_room = SubRoom::Game;
            }
        }
        info!("[Room {}] game started with {} participants", self.code, count);
        self.broadcast_game(ServerEvent::GameStarted);
        self.apply_events(events, ctx);
        Ok(())
    }

    // ---- scheduler -------------------------------------------------------

    fn cancel_turn_clock(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.turn_tick.take() {
            ctx.cancel_future(handle);
        }
    }

    fn cancel_combat_clock(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.combat_tick.take() {
            ctx.cancel_future(handle);
        }
    }

    fn cancel_transition(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.transition_timer.take() {
            ctx.cancel_future(handle);
        }
    }

    fn cancel_bot_timer(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.bot_timer.take() {
            ctx.cancel_future(handle);
        }
    }

    fn cancel_all_timers(&mut self, ctx: &mut Context<Self>) {
        self.cancel_turn_clock(ctx);
        self.cancel_combat_clock(ctx);
        self.cancel_transition(ctx);
        self.cancel_bot_timer(ctx);
    }

    /// Arm the per-second turn countdown. Forces `end_turn` at zero.
    fn arm_turn_clock(&mut self, ctx: &mut Context<Self>, remaining: u64) {
        self.cancel_turn_clock(ctx);
        self.turn_remaining = remaining;
        let handle = ctx.run_interval(Duration::from_secs(1), |act, ctx| {
            if act.game.is_none() {
                act.cancel_turn_clock(ctx);
                return;
            }
            act.turn_remaining = act.turn_remaining.saturating_sub(1);
            act.broadcast_game(ServerEvent::TimerTick { remaining_secs: act.turn_remaining });
            if act.turn_remaining == 0 {
                act.cancel_turn_clock(ctx);
                debug!("[Room {}] turn timer expired, forcing end of turn", act.code);
                let result = act.game.as_mut().map(|g| g.end_turn(None));
                match result {
                    Some(Ok(events)) => act.apply_events(events, ctx),
                    Some(Err(e)) => warn!("[Room {}] forced end_turn rejected: {e}", act.code),
                    None => {}
                }
            }
        });
        self.turn_tick = Some(handle);
    }

    /// Arm the combat countdown for the current combat actor. Forces an
    /// attack at zero so a silent combatant never stalls the room.
    fn arm_combat_clock(&mut self, ctx: &mut Context<Self>) {
        self.cancel_combat_clock(ctx);
        let Some(game) = &self.game else { return };
        let Some(session) = &game.combat else { return };
        let actor = session.current_actor();
        let duration = if session.evasions_used(actor) >= MAX_EVASION_ATTEMPTS {
            COMBAT_TURN_DURATION_NO_EVASION
        } else {
            COMBAT_TURN_DURATION
        };
        self.combat_remaining = duration;
        let handle = ctx.run_interval(Duration::from_secs(1), move |act, ctx| {
            if act.game.as_ref().map(|g| g.combat.is_none()).unwrap_or(true) {
                act.cancel_combat_clock(ctx);
                return;
            }
            act.combat_remaining = act.combat_remaining.saturating_sub(1);
            act.broadcast_game(ServerEvent::TimerTick { remaining_secs: act.combat_remaining });
            if act.combat_remaining == 0 {
                act.cancel_combat_clock(ctx);
                debug!("[Room {}] combat timer expired, forcing attack", act.code);
                let result = act
                    .game
                    .as_mut()
                    .map(|g| g.attack(actor, &mut rand::rng()));
                match result {
                    Some(Ok(events)) => act.apply_events(events, ctx),
                    Some(Err(e)) => warn!("[Room {}] forced attack rejected: {e}", act.code),
                    None => {}
                }
            }
        });
        self.combat_tick = Some(handle);
    }

    /// Arm the transition delay; when it fires the next turn becomes
    /// actionable. The callback re-checks that the game still exists.
    fn arm_transition(&mut self, ctx: &mut Context<Self>) {
        self.cancel_transition(ctx);
        let handle = ctx.run_later(Duration::from_secs(TRANSITION_DELAY), |act, ctx| {
            act.transition_timer = None;
            let Some(game) = act.game.as_mut() else { return };
            let events = game.open_turn();
            act.apply_events(events, ctx);
        });
        self.transition_timer = Some(handle);
    }

    /// Schedule a bot step if a virtual player is the one expected to act.
    fn maybe_schedule_bot(&mut self, ctx: &mut Context<Self>) {
        if self.bot_timer.is_some() {
            return;
        }
        let Some(game) = &self.game else { return };
        if game.data.game_over {
            return;
        }
        let due = match &game.combat {
            Some(session) => game
                .player(session.current_actor())
                .map(|p| p.is_virtual())
                .unwrap_or(false),
            None => {
                game.phase == GamePhase::PlayerActing
                    && !game.data.transitioning
                    && game.active_player().is_virtual()
            }
        };
        if !due {
            return;
        }
        let handle = ctx.run_later(Duration::from_secs(BOT_THINK_DELAY), |act, ctx| {
            act.bot_timer = None;
            act.bot_step(ctx);
        });
        self.bot_timer = Some(handle);
    }

    fn bot_step(&mut self, ctx: &mut Context<Self>) {
        let Some(game) = self.game.as_mut() else { return };
        if game.data.game_over {
            return;
        }

        let result = if let Some(session) = &game.combat {
            let bot_id = session.current_actor();
            if !game.player(bot_id).map(|p| p.is_virtual()).unwrap_or(false) {
                return;
            }
            match virtual_player::decide_combat_action(game, bot_id) {
                BotCombatAction::Attack => game.attack(bot_id, &mut rand::rng()),
                BotCombatAction::Evade => game.evade(bot_id, &mut rand::rng()),
            }
        } else {
            if game.phase != GamePhase::PlayerActing || !game.active_player().is_virtual() {
                return;
            }
            let bot_id = game.active_player().id;
            match virtual_player::decide_turn_action(game, bot_id) {
                BotAction::Move(pos) => game.move_player(bot_id, pos),
                BotAction::InteractDoor(pos) => game.interact_door(bot_id, pos),
                BotAction::InitiateCombat(pos) => game.initiate_combat(bot_id, pos),
                BotAction::SelectObject(kind) => game.select_object(bot_id, kind),
                BotAction::EndTurn => game.end_turn(Some(bot_id)),
            }
        };

        match result {
            Ok(events) => self.apply_events(events, ctx),
            Err(e) => {
                // A bot must never stall the room: a rejected decision
                // forfeits the rest of its turn.
                warn!("[Room {}] bot action rejected: {e}", self.code);
                let forced = self.game.as_mut().and_then(|g| {
                    if g.combat.is_none() {
                        g.end_turn(None).ok()
                    } else {
                        None
                    }
                });
                if let Some(events) = forced {
                    self.apply_events(events, ctx);
                }
            }
        }
        self.maybe_schedule_bot(ctx);
    }

    // ---- event application ----------------------------------------------

    /// Turn model events into broadcasts and scheduling decisions, then push
    /// the refreshed snapshot to the game room and the accessible-tiles
    /// highlight to the active player.
    fn apply_events(&mut self, events: Vec<GameEvent>, ctx: &mut Context<Self>) {
        if events.is_empty() {
            return;
        }
        for event in &events {
            self.apply_event(event, ctx);
        }

        let Some(game) = self.game.as_mut() else { return };
        let snapshot = game.snapshot();
        let game_over = snapshot.data.game_over;
        self.broadcast_game(ServerEvent::Snapshot { game: snapshot.clone() });
        self.broadcast_stats(ServerEvent::Snapshot { game: snapshot });

        if !game_over {
            // The active player alone sees their reachable tiles.
            if let Some(game) = self.game.as_ref() {
                if game.combat.is_none() && game.phase == GamePhase::PlayerActing {
                    let active = game.active_player().id;
                    let tiles = game.accessible_tiles();
                    self.send_to(active, ServerEvent::AccessibleTiles { tiles });
                }
            }
        }
        self.maybe_schedule_bot(ctx);
    }

    fn apply_event(&mut self, event: &GameEvent, ctx: &mut Context<Self>) {
        match event {
            GameEvent::TurnStarted { player } => {
                self.cancel_turn_clock(ctx);
                self.cancel_bot_timer(ctx);
                self.broadcast_game(ServerEvent::TurnChanged {
                    player_id: *player,
                    transition_secs: TRANSITION_DELAY,
                });
                self.arm_transition(ctx);
            }
            GameEvent::TurnOpened { .. } => {
                self.arm_turn_clock(ctx, TURN_DURATION);
            }
            GameEvent::TurnEnded { .. } => {
                self.cancel_turn_clock(ctx);
            }
            GameEvent::CombatStarted { attacker, defender } => {
                // The turn clock pauses while the combat clock runs.
                self.cancel_turn_clock(ctx);
                self.broadcast_game(ServerEvent::CombatStarted {
                    attacker: *attacker,
                    defender: *defender,
                });
                self.arm_combat_clock(ctx);
            }
            GameEvent::CombatAttacked { attacker, attack_roll, defense_roll, damage } => {
                self.broadcast_game(ServerEvent::CombatAttack {
                    attacker: *attacker,
                    attack_roll: *attack_roll,
                    defense_roll: *defense_roll,
                    damage: *damage,
                });
                self.arm_combat_clock(ctx);
            }
            GameEvent::CombatEvaded { player, success, attempts_left } => {
                self.broadcast_game(ServerEvent::CombatEvade {
                    player_id: *player,
                    success: *success,
                    attempts_left: *attempts_left,
                });
                self.arm_combat_clock(ctx);
            }
            GameEvent::CombatEnded { winner, loser, escaped } => {
                self.cancel_combat_clock(ctx);
                self.broadcast_game(ServerEvent::CombatEnded {
                    winner: *winner,
                    loser: *loser,
                    escaped: *escaped,
                });
                // If the active player survived with their turn intact, the
                // paused turn clock resumes where it stopped.
                let resume = self
                    .game
                    .as_ref()
                    .map(|g| !g.data.game_over && !g.data.transitioning && g.combat.is_none())
                    .unwrap_or(false);
                if resume {
                    let remaining = self.turn_remaining.max(1);
                    self.arm_turn_clock(ctx, remaining);
                }
            }
            GameEvent::PickupPending { player, object } => {
                self.send_to(
                    *player,
                    ServerEvent::notify(&format!(
                        "Your bag is full. Choose an object to leave behind ({object:?} found)."
                    )),
                );
            }
            GameEvent::DebugToggled { on } => {
                let state = if *on { "enabled" } else { "disabled" };
                self.broadcast_game(ServerEvent::notify(&format!("Debug mode {state}")));
            }
            GameEvent::PlayerDisconnected { player } => {
                let name = self.player_name(*player);
                self.broadcast_game(ServerEvent::notify(&format!("{name} disconnected")));
            }
            GameEvent::PlayerReconnected { player } => {
                let name = self.player_name(*player);
                self.broadcast_game(ServerEvent::notify(&format!("{name} reconnected")));
            }
            GameEvent::GameOver { winner } => {
                info!("[Room {}] game over, winner {}", self.code, winner);
                self.cancel_all_timers(ctx);
                self.broadcast_game(ServerEvent::GameOver { winner: *winner });
                for member in self.members.values_mut() {
                    if member.sub_room == SubRoom::Game {
                        member.sub_room = SubRoom::Stats;
                    }
                }
            }
            GameEvent::Moved { .. }
            | GameEvent::Slid { .. }
            | GameEvent::ObjectPickedUp { .. }
            | GameEvent::ObjectDropped { .. }
            | GameEvent::DoorToggled { .. } => {
                // Covered by the snapshot broadcast.
            }
        }
    }

    fn player_name(&self, id: Uuid) -> String {
        self.game
            .as_ref()
            .and_then(|g| g.player(id))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "A player".to_string())
    }

    // ---- dispatch --------------------------------------------------------

    fn dispatch_game_action(
        &mut self,
        player_id: Uuid,
        event: ClientEvent,
        ctx: &mut Context<Self>,
    ) {
        let result = {
            let Some(game) = self.game.as_mut() else {
                self.send_to(player_id, ServerEvent::error("The game has not started yet"));
                return;
            };
            match event {
                ClientEvent::MovePlayer { x, y } => {
                    game.move_player(player_id, Position::new(x, y))
                }
                ClientEvent::InteractDoor { x, y } => {
                    game.interact_door(player_id, Position::new(x, y))
                }
                ClientEvent::InitiateCombat { x, y } => {
                    game.initiate_combat(player_id, Position::new(x, y))
                }
                ClientEvent::Attack => game.attack(player_id, &mut rand::rng()),
                ClientEvent::Evade => game.evade(player_id, &mut rand::rng()),
                ClientEvent::EndTurn => game.end_turn(Some(player_id)),
                ClientEvent::SelectObject { object } => game.select_object(player_id, object),
                ClientEvent::ToggleDebug => game.toggle_debug(player_id),
                _ => return,
            }
        };
        match result {
            Ok(events) => self.apply_events(events, ctx),
            Err(GameError::Illegal(message)) => {
                self.send_to(player_id, ServerEvent::error(&message));
            }
            Err(GameError::Internal(detail)) => {
                // Fail-isolated: the offending channel goes home, everyone
                // else keeps playing on untouched state.
                error!("[Room {}] internal fault for {player_id}: {detail}", self.code);
                self.send_to(player_id, ServerEvent::error("Something went wrong on our side"));
                self.send_to(player_id, ServerEvent::redirect_home());
            }
        }
    }

    fn teardown(&mut self, ctx: &mut Context<Self>) {
        info!("[Room {}] tearing down", self.code);
        self.cancel_all_timers(ctx);
        self.broadcast_where(|_, _| true, ServerEvent::redirect_home());
        ctx.stop();
    }
}

impl Handler<Connect> for Room {
    type Result = ();

    fn handle(&mut self, msg: Connect, ctx: &mut Self::Context) -> Self::Result {
        // A reconnecting participant presents the player id they held.
        if let Some(game) = self.game.as_mut() {
            let known_disconnected = game
                .player(msg.player_id)
                .map(|p| !p.is_connected())
                .unwrap_or(false);
            if !known_disconnected {
                msg.addr.do_send(ServerEvent::error("This game is already running"));
                msg.addr.do_send(ServerEvent::redirect_home());
                return;
            }
            let events = game.reconnect(msg.player_id);
            if let Some(previous) = self.members.get(&msg.player_id) {
                previous.addr.do_send(ServerEvent::Kicked {
                    reason: "Another session has connected with your identity".to_string(),
                });
            }
            self.members.insert(msg.player_id, Member {
                addr: msg.addr,
                name: msg.name,
                avatar: msg.avatar,
                bonus: msg.bonus,
                dice: msg.dice,
                sub_room: SubRoom::Game,
                is_admin: false,
            });
            self.apply_events(events, ctx);
            return;
        }

        // A known identity reconnecting is never bounced by the lock or the
        // player cap; its old session is kicked and replaced.
        let existing_admin = self.members.get(&msg.player_id).map(|m| m.is_admin);
        if existing_admin.is_none() {
            if self.locked {
                msg.addr.do_send(ServerEvent::error("This room is locked"));
                msg.addr.do_send(ServerEvent::redirect_home());
                return;
            }
            if self.waiting_count() >= self.descriptor.size.max_players() {
                msg.addr.do_send(ServerEvent::error("This room is full"));
                msg.addr.do_send(ServerEvent::redirect_home());
                return;
            }
        }
        if let Some(previous) = self.members.get(&msg.player_id) {
            previous.addr.do_send(ServerEvent::Kicked {
                reason: "Another session has connected with your identity".to_string(),
            });
        }
        let is_admin =
            existing_admin.unwrap_or_else(|| self.members.values().all(|m| !m.is_admin));
        self.members.insert(msg.player_id, Member {
            addr: msg.addr,
            name: msg.name,
            avatar: msg.avatar,
            bonus: msg.bonus,
            dice: msg.dice,
            sub_room: SubRoom::Waiting,
            is_admin,
        });
        debug!("[Room {}] {} joined the waiting room", self.code, msg.player_id);
        self.send_roster();
    }
}

impl Handler<Disconnect> for Room {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, ctx: &mut Self::Context) -> Self::Result {
        // A kicked session stopping must not evict the session that
        // replaced it under the same identity.
        let same_session = self
            .members
            .get(&msg.player_id)
            .map(|m| m.addr == msg.addr)
            .unwrap_or(false);
        if !same_session {
            return;
        }
        let Some(member) = self.members.remove(&msg.player_id) else {
            return;
        };
        debug!("[Room {}] {} disconnected", self.code, msg.player_id);

        match member.sub_room {
            SubRoom::Waiting => {
                // The organizer leaving dissolves the waiting room.
                if member.is_admin {
                    self.teardown(ctx);
                } else {
                    self.send_roster();
                }
            }
            SubRoom::Game => {
                let mut batches = Vec::new();
                if let Some(game) = self.game.as_mut() {
                    batches.push(game.disconnect(msg.player_id));
                    // Liveness: a vanished active player never stalls the
                    // game; the turn skips immediately.
                    if !game.data.game_over && game.active_player().id == msg.player_id {
                        if let Ok(events) = game.end_turn(None) {
                            batches.push(events);
                        }
                    }
                }
                for events in batches {
                    self.apply_events(events, ctx);
                }
                // Everyone gone mid-game, or an empty stats room after the
                // disconnect ended the match: nothing left to serve.
                let game_over = self.game.as_ref().map(|g| g.data.game_over).unwrap_or(false);
                let in_game = self.members.values().any(|m| m.sub_room == SubRoom::Game);
                if (!game_over && !in_game) || self.members.is_empty() {
                    self.teardown(ctx);
                }
            }
            SubRoom::Stats => {
                if self.members.is_empty() {
                    self.teardown(ctx);
                }
            }
        }
    }
}

impl Handler<ClientCommand> for Room {
    type Result = ();

    fn handle(&mut self, msg: ClientCommand, ctx: &mut Self::Context) -> Self::Result {
        match msg.event {
            ClientEvent::Ping => {}
            ClientEvent::ToggleLock => {
                if !self.is_admin(msg.player_id) {
                    self.send_to(msg.player_id, ServerEvent::error("Only the organizer can lock the room"));
                    return;
                }
                self.locked = !self.locked;
                self.send_roster();
            }
            ClientEvent::KickPlayer { player_id } => {
                if !self.is_admin(msg.player_id) {
                    self.send_to(msg.player_id, ServerEvent::error("Only the organizer can kick players"));
                    return;
                }
                if self.game.is_some() {
                    self.send_to(msg.player_id, ServerEvent::error("Cannot kick players once the game started"));
                    return;
                }
                if let Some(idx) = self.bots.iter().position(|b| b.id == player_id) {
                    self.bots.remove(idx);
                    self.send_roster();
                    return;
                }
                if let Some(member) = self.members.remove(&player_id) {
                    member.addr.do_send(ServerEvent::Kicked {
                        reason: "You were removed from the room".to_string(),
                    });
                    member.addr.do_send(ServerEvent::redirect_home());
                }
                self.send_roster();
            }
            ClientEvent::AddVirtualPlayer { profile } => {
                if !self.is_admin(msg.player_id) {
                    self.send_to(msg.player_id, ServerEvent::error("Only the organizer can add virtual players"));
                    return;
                }
                if self.game.is_some() {
                    self.send_to(msg.player_id, ServerEvent::error("The game has already started"));
                    return;
                }
                if self.waiting_count() >= self.descriptor.size.max_players() {
                    self.send_to(msg.player_id, ServerEvent::error("This room is full"));
                    return;
                }
                let id = Uuid::new_v4();
                let name = format!("Bot {}", self.bots.len() + 1);
                self.bots.push(BotEntry { id, name, profile });
                self.send_roster();
            }
            ClientEvent::StartGame => {
                if let Err(e) = self.start_game(msg.player_id, ctx) {
                    match e {
                        GameError::Illegal(message) => {
                            self.send_to(msg.player_id, ServerEvent::error(&message));
                        }
                        GameError::Internal(detail) => {
                            error!("[Room {}] start failed: {detail}", self.code);
                            self.send_to(msg.player_id, ServerEvent::error("Could not start the game"));
                            self.send_to(msg.player_id, ServerEvent::redirect_home());
                        }
                    }
                }
            }
            other => self.dispatch_game_action(msg.player_id, other, ctx),
        }
    }
}
