//! Scenario tests for the game model, combat resolver, and bot driver.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::config::game::{EVASION_SUCCESS_RATE, MAX_EVASION_ATTEMPTS, VICTORIES_TO_WIN};
use crate::game::map::{MapDescriptor, MapSize};
use crate::game::objects::ObjectKind;
use crate::game::player::{AttributeBonus, DiceChoice};
use crate::game::state::{Game, GameError, GameEvent, PlayerSpec};
use crate::game::types::{BotProfile, GameMode, GamePhase, PlayerFlag, Position};
use crate::game::virtual_player::{self, BotAction, BotCombatAction};

fn open_descriptor(mode: GameMode) -> MapDescriptor {
    MapDescriptor {
        id: "test-open".to_string(),
        name: "Open Field".to_string(),
        size: MapSize::Small,
        mode,
        rows: vec![".".repeat(10); 10],
        spawns: vec![Position::new(1, 1), Position::new(8, 8), Position::new(1, 8)],
        objects: vec![],
    }
}

fn spec(name: &str, bonus: AttributeBonus) -> PlayerSpec {
    PlayerSpec {
        id: Uuid::new_v4(),
        name: name.to_string(),
        avatar: "fox".to_string(),
        bonus,
        dice: DiceChoice::Attack,
        admin: name == "alice",
        profile: None,
    }
}

/// A started two-player game on an open 10x10 map. Alice has the speed
/// bonus, so she acts first from (1,1); Bob follows from (8,8). The first
/// turn is already open.
fn two_player_game(mode: GameMode) -> (Game, Uuid, Uuid) {
    let alice = spec("alice", AttributeBonus::Speed);
    let bob = spec("bob", AttributeBonus::Health);
    let (alice_id, bob_id) = (alice.id, bob.id);
    let mut game = Game::new("4217", &open_descriptor(mode), vec![alice, bob], mode).unwrap();
    game.start_first_turn();
    game.open_turn();
    (game, alice_id, bob_id)
}

/// Stand the two players next to each other and open a combat.
fn game_in_combat() -> (Game, Uuid, Uuid) {
    let (mut game, alice, bob) = two_player_game(GameMode::Classical);
    relocate(&mut game, bob, Position::new(2, 1));
    game.initiate_combat(alice, Position::new(2, 1)).unwrap();
    (game, alice, bob)
}

fn relocate(game: &mut Game, id: Uuid, to: Position) {
    let from = game.player(id).unwrap().pos;
    game.map.set_occupant(from, None);
    game.map.set_occupant(to, Some(id));
    game.player_mut(id).unwrap().pos = to;
}

fn is_illegal(result: Result<Vec<GameEvent>, GameError>) -> bool {
    matches!(result, Err(GameError::Illegal(_)))
}

// ---- turn order and turn flow -------------------------------------------

#[test]
fn turn_order_is_speed_descending_with_stable_ties() {
    let fast = spec("fast", AttributeBonus::Speed);
    let slow_a = spec("slow-a", AttributeBonus::Health);
    let slow_b = spec("slow-b", AttributeBonus::Health);
    let (fast_id, a_id, b_id) = (fast.id, slow_a.id, slow_b.id);
    let game = Game::new(
        "1000",
        &open_descriptor(GameMode::Classical),
        vec![slow_a, fast, slow_b],
        GameMode::Classical,
    )
    .unwrap();
    let order: Vec<Uuid> = game.players.iter().map(|p| p.id).collect();
    assert_eq!(order, vec![fast_id, a_id, b_id]);
}

#[test]
fn end_turn_twice_advances_exactly_two_steps() {
    let specs: Vec<PlayerSpec> = ["alice", "bob", "carol"]
        .iter()
        .map(|n| spec(n, AttributeBonus::Health))
        .collect();
    let expected: Vec<Uuid> = specs.iter().map(|s| s.id).collect();
    let mut game = Game::new(
        "1001",
        &open_descriptor(GameMode::Classical),
        specs,
        GameMode::Classical,
    )
    .unwrap();
    game.start_first_turn();
    game.open_turn();

    assert_eq!(game.active_player().id, expected[0]);
    game.end_turn(None).unwrap();
    assert_eq!(game.active_player().id, expected[1]);
    game.end_turn(None).unwrap();
    assert_eq!(game.active_player().id, expected[2]);
}

#[test]
fn end_turn_skips_disconnected_players() {
    let specs: Vec<PlayerSpec> = ["alice", "bob", "carol"]
        .iter()
        .map(|n| spec(n, AttributeBonus::Health))
        .collect();
    let expected: Vec<Uuid> = specs.iter().map(|s| s.id).collect();
    let mut game = Game::new(
        "1002",
        &open_descriptor(GameMode::Classical),
        specs,
        GameMode::Classical,
    )
    .unwrap();
    game.start_first_turn();
    game.open_turn();

    game.player_mut(expected[1]).unwrap().set_flag(PlayerFlag::Disconnected);
    game.end_turn(None).unwrap();
    assert_eq!(game.active_player().id, expected[2], "bob must be skipped");
}

#[test]
fn disconnecting_the_active_player_hands_the_turn_over() {
    let specs: Vec<PlayerSpec> = ["alice", "bob", "carol"]
        .iter()
        .map(|n| spec(n, AttributeBonus::Health))
        .collect();
    let (alice, bob) = (specs[0].id, specs[1].id);
    let mut game = Game::new(
        "1008",
        &open_descriptor(GameMode::Classical),
        specs,
        GameMode::Classical,
    )
    .unwrap();
    game.start_first_turn();
    game.open_turn();
    assert_eq!(game.active_player().id, alice);

    game.disconnect(alice);
    assert!(!game.data.game_over);
    // The room forces the skip the moment the active player vanishes.
    game.end_turn(None).unwrap();
    assert_eq!(game.active_player().id, bob);
    assert!(game.player(alice).unwrap().has_flag(PlayerFlag::Disconnected));
}

#[test]
fn turn_is_not_actionable_during_transition() {
    let (mut game, alice, bob) = two_player_game(GameMode::Classical);
    game.end_turn(Some(alice)).unwrap();
    // Bob is active but the transition window has not elapsed.
    assert_eq!(game.active_player().id, bob);
    assert!(game.data.transitioning);
    assert!(is_illegal(game.move_player(bob, Position::new(8, 7))));

    game.open_turn();
    assert!(game.move_player(bob, Position::new(8, 7)).is_ok());
}

// ---- movement ------------------------------------------------------------

#[test]
fn move_spends_budget_and_rejects_once_exhausted() {
    let (mut game, alice, _) = two_player_game(GameMode::Classical);
    game.player_mut(alice).unwrap().moves_left = 3;

    // (1,1) -> (1,4): three base tiles straight down.
    let events = game.move_player(alice, Position::new(1, 4)).unwrap();
    assert!(matches!(events[0], GameEvent::Moved { cost: 3, .. }));
    let player = game.player(alice).unwrap();
    assert_eq!(player.pos, Position::new(1, 4));
    assert_eq!(player.moves_left, 0);

    // No budget left: every further move is rejected until the turn ends.
    assert!(is_illegal(game.move_player(alice, Position::new(1, 5))));
    game.end_turn(Some(alice)).unwrap();
    game.open_turn();
    game.end_turn(None).unwrap(); // bob passes
    game.open_turn();
    assert!(game.move_player(alice, Position::new(1, 5)).is_ok());
}

#[test]
fn move_to_unreachable_tile_changes_nothing() {
    let (mut game, alice, _) = two_player_game(GameMode::Classical);
    let before = game.player(alice).unwrap().clone();
    assert!(is_illegal(game.move_player(alice, Position::new(8, 1))));
    let after = game.player(alice).unwrap();
    assert_eq!(after.pos, before.pos);
    assert_eq!(after.moves_left, before.moves_left);
}

#[test]
fn moving_off_turn_is_rejected() {
    let (mut game, _, bob) = two_player_game(GameMode::Classical);
    assert!(is_illegal(game.move_player(bob, Position::new(8, 7))));
}

#[test]
fn bird_without_flag_moves_anywhere_flag_revokes_it() {
    let (mut game, alice, _) = two_player_game(GameMode::Classical);
    game.player_mut(alice).unwrap().pick_up(ObjectKind::Bird);
    game.player_mut(alice).unwrap().moves_left = 0;

    // Far corner, no budget: the Bird carries her there anyway.
    let far = Position::new(9, 9);
    game.move_player(alice, far).unwrap();
    assert_eq!(game.player(alice).unwrap().pos, far);

    // Holding the Flag as well revokes the privilege.
    game.player_mut(alice).unwrap().pick_up(ObjectKind::Flag);
    assert!(is_illegal(game.move_player(alice, Position::new(1, 1))));
}

#[test]
fn moving_onto_an_object_picks_it_up() {
    let (mut game, alice, _) = two_player_game(GameMode::Classical);
    let there = Position::new(2, 1);
    game.map.place_object(there, ObjectKind::Boots);

    let events = game.move_player(alice, there).unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::ObjectPickedUp { object: ObjectKind::Boots, .. })));
    let player = game.player(alice).unwrap();
    assert!(player.has_object(ObjectKind::Boots));
    assert_eq!(player.stats.objects_picked_up, 1);
    assert!(game.map.object(there).is_none());
}

#[test]
fn full_inventory_defers_pickup_until_selection() {
    let (mut game, alice, _) = two_player_game(GameMode::Classical);
    game.player_mut(alice).unwrap().pick_up(ObjectKind::Blade);
    game.player_mut(alice).unwrap().pick_up(ObjectKind::Talisman);
    let there = Position::new(2, 1);
    game.map.place_object(there, ObjectKind::Bird);

    let events = game.move_player(alice, there).unwrap();
    assert!(events.iter().any(|e| matches!(e, GameEvent::PickupPending { .. })));
    assert!(game.data.pending_pickup.is_some());

    // Acting while the selection is pending is rejected.
    assert!(is_illegal(game.move_player(alice, Position::new(3, 1))));

    // Swap the Blade out for the Bird.
    game.select_object(alice, ObjectKind::Blade).unwrap();
    let player = game.player(alice).unwrap();
    assert!(player.has_object(ObjectKind::Bird));
    assert!(!player.has_object(ObjectKind::Blade));
    assert_eq!(game.map.object(there), Some(ObjectKind::Blade));
    assert!(game.data.pending_pickup.is_none());
}

// ---- doors ---------------------------------------------------------------

#[test]
fn door_interaction_costs_an_action_and_is_reversible() {
    let mut desc = open_descriptor(GameMode::Classical);
    desc.rows[1] = "..d.......".to_string();
    let alice = spec("alice", AttributeBonus::Speed);
    let bob = spec("bob", AttributeBonus::Health);
    let alice_id = alice.id;
    let mut game = Game::new("1003", &desc, vec![alice, bob], GameMode::Classical).unwrap();
    game.start_first_turn();
    game.open_turn();

    let door = Position::new(2, 1);
    let events = game.interact_door(alice_id, door).unwrap();
    assert!(matches!(events[0], GameEvent::DoorToggled { open: true, .. }));
    assert_eq!(game.player(alice_id).unwrap().actions_left, 0);

    // The action budget is spent; a second toggle this turn is rejected.
    assert!(is_illegal(game.interact_door(alice_id, door)));
}

#[test]
fn door_interaction_requires_adjacency() {
    let mut desc = open_descriptor(GameMode::Classical);
    desc.rows[5] = ".....d....".to_string();
    let alice = spec("alice", AttributeBonus::Speed);
    let bob = spec("bob", AttributeBonus::Health);
    let alice_id = alice.id;
    let mut game = Game::new("1004", &desc, vec![alice, bob], GameMode::Classical).unwrap();
    game.start_first_turn();
    game.open_turn();

    assert!(is_illegal(game.interact_door(alice_id, Position::new(5, 5))));
}

// ---- combat --------------------------------------------------------------

#[test]
fn combat_requires_proximity_and_an_action() {
    let (mut game, alice, _) = two_player_game(GameMode::Classical);
    // Bob is on (8,8), far away.
    assert!(is_illegal(game.initiate_combat(alice, Position::new(8, 8))));
    assert!(is_illegal(game.initiate_combat(alice, Position::new(2, 1))));
}

#[test]
fn attack_damage_is_the_clamped_roll_difference() {
    let (mut game, alice, bob) = game_in_combat();
    let before = game.player(bob).unwrap().attributes.health;
    let mut rng = StdRng::seed_from_u64(11);

    let events = game.attack(alice, &mut rng).unwrap();
    let (attack_roll, defense_roll, damage) = events
        .iter()
        .find_map(|e| match e {
            GameEvent::CombatAttacked { attack_roll, defense_roll, damage, .. } => {
                Some((*attack_roll, *defense_roll, *damage))
            }
            _ => None,
        })
        .expect("an attack event");

    assert_eq!(damage, attack_roll.saturating_sub(defense_roll));
    let after = game.player(bob).unwrap().attributes.health;
    assert_eq!(after, before.saturating_sub(damage));
}

#[test]
fn health_never_goes_negative_and_loser_is_reset() {
    let (mut game, alice, bob) = game_in_combat();
    game.player_mut(bob).unwrap().attributes.health = 1;
    game.data.debug = true; // pin the dice: attacker max, defender min

    let events = game.attack(alice, &mut StdRng::seed_from_u64(1)).unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::CombatEnded { winner: Some(w), escaped: false, .. } if *w == alice
    )));

    let loser = game.player(bob).unwrap();
    assert_eq!(loser.attributes.health, loser.attributes.max_health);
    assert!(loser.has_flag(PlayerFlag::DeadInCombat));
    assert_eq!(loser.stats.defeats, 1);
    assert_eq!(game.player(alice).unwrap().stats.victories, 1);
    assert!(game.combat.is_none());
}

#[test]
fn combat_loser_relocates_to_an_adjacent_free_tile() {
    let (mut game, alice, bob) = game_in_combat();
    let original = game.player(bob).unwrap().pos;
    game.player_mut(bob).unwrap().attributes.health = 1;
    game.data.debug = true;

    game.attack(alice, &mut StdRng::seed_from_u64(1)).unwrap();
    let relocated = game.player(bob).unwrap().pos;
    assert_ne!(relocated, original);
    assert!(relocated.is_adjacent(original));
    assert_eq!(game.map.occupant(relocated), Some(bob));
    assert_eq!(game.map.occupant(original), None);
}

#[test]
fn losing_your_own_combat_ends_your_turn() {
    // Three players so a forfeit does not also end the whole game.
    let specs: Vec<PlayerSpec> = ["alice", "bob", "carol"]
        .iter()
        .map(|n| spec(n, AttributeBonus::Health))
        .collect();
    let (alice, bob) = (specs[0].id, specs[1].id);
    let mut game = Game::new(
        "1009",
        &open_descriptor(GameMode::Classical),
        specs,
        GameMode::Classical,
    )
    .unwrap();
    game.start_first_turn();
    game.open_turn();
    relocate(&mut game, bob, Position::new(2, 1));
    game.initiate_combat(alice, Position::new(2, 1)).unwrap();

    // A forfeit makes the active player lose deterministically.
    game.disconnect(alice);
    assert!(game.combat.is_none(), "forfeit closes the combat");
    assert!(!game.data.game_over);
    assert_eq!(game.player(alice).unwrap().stats.defeats, 1);
    assert_eq!(game.player(bob).unwrap().stats.victories, 1);
    // Alice was the active player; her turn ended with the loss.
    assert_eq!(game.active_player().id, bob);
}

#[test]
fn evasion_is_bounded_and_statted() {
    let (mut game, alice, _) = game_in_combat();
    let mut rng = StdRng::seed_from_u64(3);

    let mut attempts = 0;
    loop {
        let events = game.evade(alice, &mut rng).unwrap();
        attempts += 1;
        let success = events
            .iter()
            .find_map(|e| match e {
                GameEvent::CombatEvaded { success, .. } => Some(*success),
                _ => None,
            })
            .unwrap();
        if success {
            assert!(game.combat.is_none());
            assert_eq!(game.player(alice).unwrap().stats.evasions, 1);
            // No victory or defeat is recorded on either side.
            assert_eq!(game.player(alice).unwrap().stats.defeats, 0);
            return;
        }
        assert!(game.combat.is_some());
        // Failed attempt: the combat turn passed to the opponent; give it
        // back so Alice can retry.
        if let Some(session) = game.combat.as_mut() {
            session.turn = crate::game::types::CombatTurn::Attacker;
        }
        if attempts == MAX_EVASION_ATTEMPTS {
            assert!(is_illegal(game.evade(alice, &mut rng)));
            return;
        }
    }
}

#[test]
fn evasion_rate_converges_to_the_constant() {
    let mut rng = StdRng::seed_from_u64(42);
    let trials = 10_000;
    let successes = (0..trials)
        .filter(|_| rng.random::<f64>() < EVASION_SUCCESS_RATE)
        .count();
    let rate = successes as f64 / trials as f64;
    assert!((rate - EVASION_SUCCESS_RATE).abs() < 0.02, "sampled rate {rate}");
}

#[test]
fn blade_ends_combat_before_the_roll() {
    let (mut game, alice, bob) = game_in_combat();
    game.player_mut(alice).unwrap().pick_up(ObjectKind::Blade);
    game.player_mut(bob).unwrap().attributes.health = 2;

    let events = game.attack(alice, &mut StdRng::seed_from_u64(5)).unwrap();
    // No dice event: the hook decided the combat.
    assert!(!events.iter().any(|e| matches!(e, GameEvent::CombatAttacked { .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::CombatEnded { winner: Some(w), .. } if *w == alice
    )));
}

#[test]
fn talisman_suppresses_the_winner_victory() {
    let (mut game, alice, bob) = game_in_combat();
    game.player_mut(bob).unwrap().pick_up(ObjectKind::Talisman);
    game.player_mut(bob).unwrap().attributes.health = 1;
    game.data.debug = true;

    game.attack(alice, &mut StdRng::seed_from_u64(5)).unwrap();
    assert_eq!(game.player(alice).unwrap().stats.victories, 0);
    assert_eq!(game.player(bob).unwrap().stats.defeats, 1);
}

#[test]
fn acting_outside_your_combat_turn_is_rejected() {
    let (mut game, _, bob) = game_in_combat();
    let mut rng = StdRng::seed_from_u64(9);
    assert!(is_illegal(game.attack(bob, &mut rng)));
    assert!(is_illegal(game.evade(bob, &mut rng)));
}

// ---- win conditions ------------------------------------------------------

#[test]
fn classical_ends_at_the_victory_threshold() {
    let (mut game, alice, bob) = game_in_combat();
    game.player_mut(alice).unwrap().stats.victories = VICTORIES_TO_WIN - 1;
    game.player_mut(bob).unwrap().attributes.health = 1;
    game.data.debug = true;

    let events = game.attack(alice, &mut StdRng::seed_from_u64(2)).unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::GameOver { winner } if *winner == alice
    )));
    assert!(game.data.game_over);
    assert_eq!(game.phase, GamePhase::GameOver);
}

#[test]
fn ctf_ends_when_the_flag_comes_home() {
    let (mut game, alice, _) = two_player_game(GameMode::Ctf);
    let spawn = game.player(alice).unwrap().spawn_point.unwrap();
    game.map.place_object(Position::new(2, 1), ObjectKind::Flag);

    game.move_player(alice, Position::new(2, 1)).unwrap();
    assert!(game.player(alice).unwrap().has_object(ObjectKind::Flag));
    assert!(!game.data.game_over);

    let events = game.move_player(alice, spawn).unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::GameOver { winner } if *winner == alice
    )));
    assert!(game.data.game_over);
}

#[test]
fn teammates_cannot_fight_in_ctf() {
    let alice = spec("alice", AttributeBonus::Speed);
    let bob = spec("bob", AttributeBonus::Health);
    let carol = spec("carol", AttributeBonus::Health);
    let (alice_id, carol_id) = (alice.id, carol.id);
    let mut game = Game::new(
        "1005",
        &open_descriptor(GameMode::Ctf),
        vec![alice, bob, carol],
        GameMode::Ctf,
    )
    .unwrap();
    game.start_first_turn();
    game.open_turn();

    // Turn order: alice (speed 6), then bob, carol. Teams alternate down the
    // order, so alice and carol share one.
    assert_eq!(game.player(alice_id).unwrap().team(), game.player(carol_id).unwrap().team());
    relocate(&mut game, carol_id, Position::new(2, 1));
    assert!(is_illegal(game.initiate_combat(alice_id, Position::new(2, 1))));
}

#[test]
fn last_connected_player_wins() {
    let (mut game, alice, bob) = two_player_game(GameMode::Classical);
    let events = game.disconnect(alice);
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::GameOver { winner } if *winner == bob
    )));
    assert!(game.data.game_over);
}

#[test]
fn game_over_resets_players_and_fires_reset_hooks() {
    let (mut game, alice, bob) = two_player_game(GameMode::Classical);
    let base_speed = game.player(bob).unwrap().attributes.speed;
    game.player_mut(bob).unwrap().pick_up(ObjectKind::Boots);
    game.player_mut(bob).unwrap().attributes.health = 2;

    game.disconnect(alice);
    assert!(game.data.game_over);
    let bob_after = game.player(bob).unwrap();
    assert_eq!(bob_after.attributes.speed, base_speed, "boots bonus removed");
    assert_eq!(bob_after.attributes.health, bob_after.attributes.max_health);
}

// ---- illegal actions leave no trace --------------------------------------

#[test]
fn debug_toggle_is_admin_only() {
    let (mut game, alice, bob) = two_player_game(GameMode::Classical);
    assert!(is_illegal(game.toggle_debug(bob)));
    game.toggle_debug(alice).unwrap();
    assert!(game.data.debug);
}

#[test]
fn door_and_combat_actions_are_rejected_during_combat() {
    let (mut game, alice, _) = game_in_combat();
    assert!(is_illegal(game.move_player(alice, Position::new(1, 2))));
    assert!(is_illegal(game.end_turn(Some(alice))));
}

// ---- virtual players -----------------------------------------------------

#[test]
fn aggressive_bot_fights_adjacent_opponents() {
    let alice = spec("alice", AttributeBonus::Speed);
    let bot = PlayerSpec {
        id: Uuid::new_v4(),
        name: "Bot 1".to_string(),
        avatar: "robot".to_string(),
        bonus: AttributeBonus::Speed,
        dice: DiceChoice::Attack,
        admin: false,
        profile: Some(BotProfile::Aggressive),
    };
    let bot_id = bot.id;
    let alice_pos = Position::new(1, 1);
    let mut game = Game::new(
        "1006",
        &open_descriptor(GameMode::Classical),
        vec![alice, bot],
        GameMode::Classical,
    )
    .unwrap();
    game.start_first_turn();
    game.open_turn();
    // Both have the speed bonus; make sure it is the bot's turn.
    if game.active_player().id != bot_id {
        game.end_turn(None).unwrap();
        game.open_turn();
    }
    relocate(&mut game, bot_id, Position::new(2, 1));

    let action = virtual_player::decide_turn_action(&game, bot_id);
    assert_eq!(action, BotAction::InitiateCombat(alice_pos));
}

#[test]
fn aggressive_bot_closes_distance_when_nobody_is_adjacent() {
    let (mut game, alice, bob) = two_player_game(GameMode::Classical);
    let bot_id = bob;
    game.player_mut(bot_id).unwrap().bot_profile = Some(BotProfile::Aggressive);
    game.player_mut(bot_id).unwrap().set_flag(PlayerFlag::Virtual);
    game.end_turn(Some(alice)).unwrap();
    game.open_turn();

    let action = virtual_player::decide_turn_action(&game, bot_id);
    let BotAction::Move(target) = action else {
        panic!("expected a move, got {action:?}");
    };
    let alice_pos = game.player(alice).unwrap().pos;
    let before = game.player(bot_id).unwrap().pos.manhattan(alice_pos);
    assert!(target.manhattan(alice_pos) < before);
}

#[test]
fn defensive_bot_evades_when_hurt_and_fights_when_healthy() {
    let (mut game, alice, bob) = two_player_game(GameMode::Classical);
    game.player_mut(bob).unwrap().bot_profile = Some(BotProfile::Defensive);
    game.player_mut(bob).unwrap().set_flag(PlayerFlag::Virtual);

    // In combat while hurt: prefers evasion.
    relocate(&mut game, bob, Position::new(2, 1));
    game.initiate_combat(alice, Position::new(2, 1)).unwrap();
    game.player_mut(bob).unwrap().attributes.health = 2;
    if let Some(session) = game.combat.as_mut() {
        session.turn = crate::game::types::CombatTurn::Defender;
    }
    assert_eq!(virtual_player::decide_combat_action(&game, bob), BotCombatAction::Evade);

    // Healthy again: fights back.
    game.player_mut(bob).unwrap().attributes.health =
        game.player(bob).unwrap().attributes.max_health;
    assert_eq!(virtual_player::decide_combat_action(&game, bob), BotCombatAction::Attack);
}

#[test]
fn bot_resolves_pending_pickups_by_priority() {
    let (mut game, alice, _) = two_player_game(GameMode::Classical);
    game.player_mut(alice).unwrap().bot_profile = Some(BotProfile::Aggressive);
    game.player_mut(alice).unwrap().pick_up(ObjectKind::Talisman);
    game.player_mut(alice).unwrap().pick_up(ObjectKind::Boots);
    let there = Position::new(2, 1);
    game.map.place_object(there, ObjectKind::Blade);
    game.move_player(alice, there).unwrap();
    assert!(game.data.pending_pickup.is_some());

    // The aggressive table ranks the Talisman last; it gets dropped.
    let action = virtual_player::decide_turn_action(&game, alice);
    assert_eq!(action, BotAction::SelectObject(ObjectKind::Talisman));
    game.select_object(alice, ObjectKind::Talisman).unwrap();
    assert!(game.player(alice).unwrap().has_object(ObjectKind::Blade));
}

#[test]
fn bot_with_nothing_to_do_ends_its_turn() {
    let alice = spec("alice", AttributeBonus::Speed);
    let alice_id = alice.id;
    let bot = PlayerSpec {
        id: Uuid::new_v4(),
        name: "Bot 1".to_string(),
        avatar: "robot".to_string(),
        bonus: AttributeBonus::Health,
        dice: DiceChoice::Attack,
        admin: false,
        profile: Some(BotProfile::Aggressive),
    };
    let bot_id = bot.id;
    let mut game = Game::new(
        "1007",
        &open_descriptor(GameMode::Classical),
        vec![alice, bot],
        GameMode::Classical,
    )
    .unwrap();
    game.start_first_turn();
    game.open_turn();
    assert_eq!(game.active_player().id, alice_id);
    game.end_turn(Some(alice_id)).unwrap();
    game.open_turn();

    // Exhaust the bot's budget so no maneuver can improve its position.
    game.player_mut(bot_id).unwrap().moves_left = 0;
    game.player_mut(bot_id).unwrap().actions_left = 0;
    assert_eq!(virtual_player::decide_turn_action(&game, bot_id), BotAction::EndTurn);
}

// ---- accessible tiles ----------------------------------------------------

#[test]
fn accessible_tiles_are_within_budget_and_avoid_blockers() {
    let (mut game, alice, bob) = two_player_game(GameMode::Classical);
    relocate(&mut game, bob, Position::new(1, 2));
    let tiles = game.accessible_tiles();
    let bob_pos = game.player(bob).unwrap().pos;
    assert!(!tiles.contains(&bob_pos), "another player's tile is not accessible");
    let budget = game.player(alice).unwrap().moves_left;
    for tile in tiles {
        let cost = game.player(alice).unwrap().pos.manhattan(tile) as u32;
        assert!(cost <= budget, "open map: manhattan is a lower bound on cost");
    }
}

#[test]
fn snapshot_reports_refreshed_stats() {
    let (mut game, alice, _) = two_player_game(GameMode::Classical);
    game.move_player(alice, Position::new(1, 3)).unwrap();
    let snapshot = game.snapshot();
    assert!(snapshot.stats.tiles_visited_pct > 0.0);
    assert_eq!(snapshot.stats.turns, 1);
    assert_eq!(snapshot.code, "4217");
}
