//! Creature spawning, targeting and territory entry.

use crate::events::{CreatureMoveEvent, CreatureSpawnEvent, CreatureTargetEvent};
use crate::guard::GuardedEvent;
use crate::TerritoryGuard;
use territory_core::{ActionKind, Actor, Decision, Intent};

impl GuardedEvent for CreatureSpawnEvent {
    fn intent(&self) -> Intent {
        Intent::new(Actor::Environment, self.location, ActionKind::MobSpawn { hostile: self.hostile })
    }
}

impl GuardedEvent for CreatureTargetEvent {
    fn intent(&self) -> Intent {
        Intent::new(
            Actor::Environment,
            self.target_location,
            ActionKind::CreatureTarget { hostile: self.hostile },
        )
    }
}

impl GuardedEvent for CreatureMoveEvent {
    fn intent(&self) -> Intent {
        Intent::new(Actor::Environment, self.to, ActionKind::CreatureEnter { hostile: self.hostile })
    }
}

impl TerritoryGuard {
    pub fn on_creature_spawn(&mut self, event: &mut CreatureSpawnEvent) -> Decision {
        self.guard(event)
    }

    /// Cancelling drops the target; the creature keeps existing.
    pub fn on_creature_target(&mut self, event: &mut CreatureTargetEvent) -> Decision {
        self.guard(event)
    }

    /// Only moves that cross into another chunk are checked.
    pub fn on_creature_move(&mut self, event: &mut CreatureMoveEvent) -> Decision {
        if event.from.chunk() == event.to.chunk() {
            return Decision::Allow;
        }
        self.guard(event)
    }
}

#[cfg(test)]
mod tests {
    use crate::events::{CreatureMoveEvent, CreatureSpawnEvent, CreatureTargetEvent};
    use crate::handlers::fixture::{block_in, world};
    use territory_core::{Decision, DenyReason, TerritoryFlag};

    fn spawn(cx: i32, hostile: bool) -> CreatureSpawnEvent {
        CreatureSpawnEvent {
            location: block_in(cx, 0),
            hostile,
            cancelled: false,
        }
    }

    #[test]
    fn test_safe_zone_blocks_every_spawn() {
        let mut w = world();
        for hostile in [true, false] {
            let mut event = spawn(5, hostile);
            assert_eq!(w.guard.on_creature_spawn(&mut event), Decision::Deny(DenyReason::SafeZone));
        }
    }

    #[test]
    fn test_guild_blocks_hostiles_until_flag_is_set() {
        let mut w = world();

        let mut passive = spawn(0, false);
        let mut hostile = spawn(0, true);
        assert!(w.guard.on_creature_spawn(&mut passive).is_allowed());
        assert_eq!(w.guard.on_creature_spawn(&mut hostile), Decision::Deny(DenyReason::HostileMob));

        let owner = territory_core::Requester::player(w.owner);
        let guild = w.guild;
        assert!(w
            .guard
            .service_mut()
            .toggle_flag(&owner, guild, TerritoryFlag::MobSpawning)
            .unwrap());

        let mut hostile = spawn(0, true);
        assert!(w.guard.on_creature_spawn(&mut hostile).is_allowed());
    }

    #[test]
    fn test_hostile_target_in_safe_zone_is_dropped() {
        let mut w = world();
        let mut hostile = CreatureTargetEvent {
            target: w.user,
            target_location: block_in(5, 0),
            hostile: true,
            cancelled: false,
        };
        let mut passive = CreatureTargetEvent { hostile: false, ..hostile.clone() };

        assert_eq!(w.guard.on_creature_target(&mut hostile), Decision::Deny(DenyReason::HostileMob));
        assert!(hostile.cancelled);
        assert!(w.guard.on_creature_target(&mut passive).is_allowed());
        assert!(w.sink.messages_for(w.user).is_empty());
    }

    #[test]
    fn test_hostile_cannot_walk_into_safe_zone() {
        let mut w = world();
        let mut event = CreatureMoveEvent {
            from: block_in(4, 0),
            to: block_in(5, 0),
            hostile: true,
            cancelled: false,
        };

        w.guard.on_creature_move(&mut event);

        assert!(event.cancelled);
    }

    #[test]
    fn test_move_inside_one_chunk_is_not_checked() {
        let mut w = world();
        let inside = block_in(5, 0);
        let mut event = CreatureMoveEvent {
            from: inside,
            to: inside.offset(1, 0, 0),
            hostile: true,
            cancelled: false,
        };

        assert!(w.guard.on_creature_move(&mut event).is_allowed());
        assert_eq!(w.guard.stats().total(), 0);
    }
}
