//! Damage dealt to players.
//!
//! Damage is decided at the victim's location. When the attacker is a player
//! the attacker's location is checked as well, so nobody can hit out of a
//! safe zone at a player standing outside it.

use crate::events::{DamageSource, PlayerDamageEvent};
use crate::TerritoryGuard;
use territory_core::{ActionKind, Actor, Decision, Intent};

impl TerritoryGuard {
    pub fn on_player_damage(&mut self, event: &mut PlayerDamageEvent) -> Decision {
        if event.cancelled {
            return Decision::Allow;
        }

        let decision = match event.source {
            DamageSource::Player { actor, location } => {
                let attacker = Actor::Player(actor.into());
                let at_victim = self.service().decide(&attacker, event.victim_location, ActionKind::PlayerDamage);
                let at_attacker = self.service().decide(&attacker, location, ActionKind::PlayerDamage);
                let combined = if at_victim.is_denied() { at_victim } else { at_attacker };
                self.settle(&attacker, combined)
            }
            DamageSource::Creature { .. } | DamageSource::Environment => self.enforce(Intent::new(
                Actor::Environment,
                event.victim_location,
                ActionKind::PlayerDamage,
            )),
        };

        if decision.is_denied() {
            event.cancelled = true;
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use crate::events::{DamageSource, EventActor, PlayerDamageEvent};
    use crate::handlers::fixture::{block_in, world};
    use territory_core::{Decision, DenyReason};

    fn pvp(attacker: EventActor, attacker_chunk: i32, victim: territory_core::PlayerId, victim_chunk: i32) -> PlayerDamageEvent {
        PlayerDamageEvent {
            victim,
            victim_location: block_in(victim_chunk, 0),
            source: DamageSource::Player {
                actor: attacker,
                location: block_in(attacker_chunk, 0),
            },
            cancelled: false,
        }
    }

    #[test]
    fn test_no_damage_inside_safe_zone() {
        let mut w = world();
        let mut fall = PlayerDamageEvent {
            victim: w.user,
            victim_location: block_in(5, 0),
            source: DamageSource::Environment,
            cancelled: false,
        };
        let mut bite = PlayerDamageEvent {
            source: DamageSource::Creature { hostile: true },
            ..fall.clone()
        };

        assert_eq!(w.guard.on_player_damage(&mut fall), Decision::Deny(DenyReason::SafeZone));
        assert_eq!(w.guard.on_player_damage(&mut bite), Decision::Deny(DenyReason::SafeZone));
        assert!(fall.cancelled && bite.cancelled);
    }

    #[test]
    fn test_cannot_attack_out_of_safe_zone() {
        let mut w = world();
        let mut event = pvp(EventActor::player(w.owner), 5, w.user, 4);

        assert_eq!(w.guard.on_player_damage(&mut event), Decision::Deny(DenyReason::SafeZone));
        assert!(event.cancelled);
        assert_eq!(w.sink.messages_for(w.owner), vec!["You cannot do that in the SafeZone."]);
    }

    #[test]
    fn test_cannot_attack_into_safe_zone() {
        let mut w = world();
        let mut event = pvp(EventActor::player(w.owner), 4, w.user, 5);

        assert!(w.guard.on_player_damage(&mut event).is_denied());
    }

    #[test]
    fn test_war_zone_and_guild_land_allow_pvp() {
        let mut w = world();
        let mut war = pvp(EventActor::player(w.owner), 6, w.user, 6);
        let mut guild = pvp(EventActor::player(w.user), 0, w.moderator, 1);

        assert!(w.guard.on_player_damage(&mut war).is_allowed());
        assert!(w.guard.on_player_damage(&mut guild).is_allowed());
    }
}
