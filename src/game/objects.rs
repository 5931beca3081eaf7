//! Game objects and their effect hooks.
//!
//! Each object's behavior is a set of plain function pointers registered in a
//! static table keyed by object kind. Hooks fire at four points: before an
//! attack, when a combat ends, when a player moves, and when a player is
//! reset at the end of a match. No object carries behavior through trait
//! objects; dispatch is by kind lookup only.

use serde::{Serialize, Deserialize};

use crate::config::game::{BLADE_EXECUTION_THRESHOLD, BOOTS_SPEED_BONUS};
use crate::game::player::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Flag,
    Bird,
    Blade,
    Talisman,
    Boots,
}

/// Adjustments an object can make when a combat ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatEndAdjust {
    /// Suppress the opponent's victory increment (holder lost the combat).
    pub suppress_opponent_victory: bool,
}

/// Effect hooks for one object kind. Absent hooks mean the object does
/// nothing at that point.
pub struct ObjectEffects {
    /// May force an instant win for the attacker. Fired before dice roll.
    pub before_attack: Option<fn(attacker: &Player, defender: &Player) -> bool>,
    /// Fired on the holder when a combat they took part in ends.
    pub on_combat_end: Option<fn(holder: &Player, holder_won: bool) -> CombatEndAdjust>,
    /// May bypass movement cost and accessibility rules for the holder.
    pub on_move: Option<fn(holder: &Player) -> bool>,
    /// End-of-match cleanup of any attribute changes the object made.
    pub on_player_reset: Option<fn(player: &mut Player)>,
}

const NO_EFFECTS: ObjectEffects = ObjectEffects {
    before_attack: None,
    on_combat_end: None,
    on_move: None,
    on_player_reset: None,
};

/// Static effect registry. Kinds absent from this table have no hooks.
pub static EFFECT_TABLE: &[(ObjectKind, ObjectEffects)] = &[
    (ObjectKind::Bird, ObjectEffects { on_move: Some(bird_on_move), ..NO_EFFECTS }),
    (ObjectKind::Blade, ObjectEffects { before_attack: Some(blade_before_attack), ..NO_EFFECTS }),
    (ObjectKind::Talisman, ObjectEffects { on_combat_end: Some(talisman_on_combat_end), ..NO_EFFECTS }),
    (ObjectKind::Boots, ObjectEffects { on_player_reset: Some(boots_on_player_reset), ..NO_EFFECTS }),
];

pub fn effects(kind: ObjectKind) -> &'static ObjectEffects {
    EFFECT_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, e)| e)
        .unwrap_or(&NO_EFFECTS)
}

/// The Bird grants free movement, but only while the holder does not also
/// carry the Flag.
pub fn player_has_bird_without_flag(player: &Player) -> bool {
    player.has_object(ObjectKind::Bird) && !player.has_object(ObjectKind::Flag)
}

/// One-shot attribute changes applied when an object is picked up. The
/// matching removal happens in the object's `on_player_reset` hook or when
/// the object is dropped.
pub fn apply_pickup_bonus(player: &mut Player, kind: ObjectKind) {
    if kind == ObjectKind::Boots {
        player.attributes.speed += BOOTS_SPEED_BONUS;
    }
}

/// Reverse of `apply_pickup_bonus`, for objects dropped mid-game.
pub fn remove_pickup_bonus(player: &mut Player, kind: ObjectKind) {
    if kind == ObjectKind::Boots {
        player.attributes.speed = player.attributes.speed.saturating_sub(BOOTS_SPEED_BONUS);
    }
}

fn bird_on_move(holder: &Player) -> bool {
    player_has_bird_without_flag(holder)
}

fn blade_before_attack(_attacker: &Player, defender: &Player) -> bool {
    defender.attributes.health <= BLADE_EXECUTION_THRESHOLD
}

fn talisman_on_combat_end(_holder: &Player, holder_won: bool) -> CombatEndAdjust {
    CombatEndAdjust {
        suppress_opponent_victory: !holder_won,
    }
}

fn boots_on_player_reset(player: &mut Player) {
    player.attributes.speed = player.attributes.speed.saturating_sub(BOOTS_SPEED_BONUS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::{build_attributes, AttributeBonus, DiceChoice, Player};
    use crate::game::types::Position;

    fn player_with(objects: &[ObjectKind]) -> Player {
        let attributes = build_attributes(AttributeBonus::Health, DiceChoice::Attack);
        let mut p = Player::new(uuid::Uuid::new_v4(), "tester", "owl", attributes);
        for kind in objects {
            p.inventory.push(*kind);
        }
        p
    }

    #[test]
    fn bird_grants_free_move_only_without_flag() {
        let with_bird = player_with(&[ObjectKind::Bird]);
        assert!(player_has_bird_without_flag(&with_bird));

        let with_both = player_with(&[ObjectKind::Bird, ObjectKind::Flag]);
        assert!(!player_has_bird_without_flag(&with_both));
    }

    #[test]
    fn blade_triggers_at_low_defender_health() {
        let attacker = player_with(&[ObjectKind::Blade]);
        let mut defender = player_with(&[]);
        defender.attributes.health = BLADE_EXECUTION_THRESHOLD;

        let hook = effects(ObjectKind::Blade).before_attack.unwrap();
        assert!(hook(&attacker, &defender));

        defender.attributes.health = BLADE_EXECUTION_THRESHOLD + 1;
        assert!(!hook(&attacker, &defender));
    }

    #[test]
    fn talisman_suppresses_opponent_victory_on_loss() {
        let holder = player_with(&[ObjectKind::Talisman]);
        let hook = effects(ObjectKind::Talisman).on_combat_end.unwrap();
        assert!(hook(&holder, false).suppress_opponent_victory);
        assert!(!hook(&holder, true).suppress_opponent_victory);
    }

    #[test]
    fn boots_bonus_is_removed_on_reset() {
        let mut p = player_with(&[]);
        let base_speed = p.attributes.speed;
        apply_pickup_bonus(&mut p, ObjectKind::Boots);
        p.inventory.push(ObjectKind::Boots);
        assert_eq!(p.attributes.speed, base_speed + BOOTS_SPEED_BONUS);

        let hook = effects(ObjectKind::Boots).on_player_reset.unwrap();
        hook(&mut p);
        assert_eq!(p.attributes.speed, base_speed);
    }

    #[test]
    fn flag_has_no_hooks() {
        let e = effects(ObjectKind::Flag);
        assert!(e.before_attack.is_none());
        assert!(e.on_combat_end.is_none());
        assert!(e.on_move.is_none());
        assert!(e.on_player_reset.is_none());
    }

    #[test]
    fn positions_measure_adjacency() {
        let a = Position::new(2, 2);
        assert!(a.is_adjacent(Position::new(2, 3)));
        assert!(!a.is_adjacent(Position::new(3, 3)));
    }
}
